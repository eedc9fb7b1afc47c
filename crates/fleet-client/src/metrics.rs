//! Client-side metrics
//!
//! Recorded through the `metrics` facade; the embedding binary decides
//! whether a recorder is installed. Without one these calls are no-ops.
//!
//! - `fleet_client_requests_total` (counter): labels `method`, `status`
//! - `fleet_client_request_duration_seconds` (histogram): label `method`
//! - `fleet_client_retries_total` (counter): label `cause`
//! - `fleet_client_token_refresh_total` (counter): label `outcome`

/// Record one HTTP attempt. `status` is `"error"` when no response arrived.
pub fn record_request(method: &str, status: &str, duration_secs: f64) {
    metrics::counter!(
        "fleet_client_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("fleet_client_request_duration_seconds", "method" => method.to_string())
        .record(duration_secs);
}

/// Record a scheduled retry; `cause` is `"network"` or `"status"`.
pub fn record_retry(cause: &str) {
    metrics::counter!("fleet_client_retries_total", "cause" => cause.to_string()).increment(1);
}

/// Record the outcome of a token refresh (`"success"` or `"failure"`).
pub fn record_refresh(outcome: &str) {
    metrics::counter!("fleet_client_token_refresh_total", "outcome" => outcome.to_string())
        .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_request("GET", "200", 0.01);
        record_retry("network");
        record_refresh("success");
    }

    #[test]
    fn record_request_carries_method_and_status() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_request("GET", "200", 0.02);
        record_request("POST", "error", 0.5);

        let output = handle.render();
        assert!(output.contains("fleet_client_requests_total"));
        assert!(output.contains("method=\"GET\""));
        assert!(output.contains("status=\"200\""));
        assert!(output.contains("status=\"error\""));
        assert!(output.contains("fleet_client_request_duration_seconds"));
    }

    #[test]
    fn retry_and_refresh_counters_are_labelled() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_retry("status");
        record_retry("status");
        record_refresh("failure");

        let output = handle.render();
        assert!(output.contains("fleet_client_retries_total{cause=\"status\"} 2"));
        assert!(output.contains("fleet_client_token_refresh_total{outcome=\"failure\"} 1"));
    }
}
