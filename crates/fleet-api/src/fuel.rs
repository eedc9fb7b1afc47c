//! `/fuel` endpoints

use fleet_client::{ApiClient, ApiRequest, Result};

use crate::types::fuel::CreateFuelRequest;
use crate::types::{DriverFuelHistory, FuelEntry, FuelRecord, FuelReportItem, ReportFilter, VehicleFuelHistory};

/// Record a manual fuel entry.
pub async fn create(client: &ApiClient, entry: &FuelEntry) -> Result<FuelRecord> {
    let request = ApiRequest::post("/fuel").json(&CreateFuelRequest::from(entry))?;
    client.call(request, "Failed to create fuel record").await
}

pub async fn vehicle_history(
    client: &ApiClient,
    vehicle_id: u64,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<VehicleFuelHistory> {
    let request = date_range(ApiRequest::get(format!("/fuel/vehicle/{vehicle_id}")), from, to);
    client
        .call(request, "Failed to fetch vehicle fuel history")
        .await
}

pub async fn driver_history(
    client: &ApiClient,
    driver_id: &str,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<DriverFuelHistory> {
    let request = date_range(ApiRequest::get(format!("/fuel/driver/{driver_id}")), from, to);
    client
        .call(request, "Failed to fetch driver fuel history")
        .await
}

/// Fleet consumption report; each vehicle id is sent as its own
/// `vehicleIds` parameter.
pub async fn report(client: &ApiClient, filter: &ReportFilter) -> Result<Vec<FuelReportItem>> {
    let request = filter.vehicle_ids.iter().fold(
        ApiRequest::get("/fuel/report")
            .query("from", &filter.from)
            .query("to", &filter.to),
        |request, id| request.query("vehicleIds", id),
    );
    let request = request.query_opt("machineryType", filter.machinery_type);
    client.call(request, "Failed to fetch fuel report").await
}

fn date_range(request: ApiRequest, from: Option<&str>, to: Option<&str>) -> ApiRequest {
    request
        .query_opt("from", from.filter(|d| !d.is_empty()))
        .query_opt("to", to.filter(|d| !d.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MachineryType;
    use crate::test_support::logged_in_client;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn create_sends_manual_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fuel"))
            .and(body_json(json!({
                "driverId": "d-1",
                "vehicleId": "4",
                "liters": 40.13,
                "odometer": 30510.0,
                "routeId": "12",
                "source": "manual"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "f-9",
                "driverId": "d-1",
                "vehicleId": 4,
                "routeId": 12,
                "liters": 40.13,
                "source": "manual",
                "recordedAt": "2025-03-01T12:00:00Z",
                "createdAt": "2025-03-01T12:00:00Z",
                "updatedAt": "2025-03-01T12:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = logged_in_client(&server.uri()).await;
        let entry = FuelEntry {
            driver_id: "d-1".into(),
            vehicle_id: 4,
            liters: 40.1299,
            odometer: Some(30510.0),
            route_id: Some(12),
        };
        let record = create(&client, &entry).await.unwrap();
        assert_eq!(record.id, "f-9");
    }

    #[tokio::test]
    async fn report_repeats_vehicle_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fuel/report"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "vehicle": {"id": 4, "plate": "ABC-123", "machineryType": 1, "brand": "Volvo", "model": "FH16"},
                "totalLiters": 310.5,
                "avgLitersPerKm": 0.34,
                "recordsCount": 6,
                "anomaliesDetected": 1
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let client = logged_in_client(&server.uri()).await;
        let filter = ReportFilter {
            from: "2025-03-01".into(),
            to: "2025-03-31".into(),
            vehicle_ids: vec![4, 7],
            machinery_type: Some(MachineryType::Heavy),
        };
        let items = report(&client, &filter).await.unwrap();
        assert_eq!(items[0].vehicle.machinery_type, MachineryType::Heavy);
        assert!(items[0].anomaly_records.is_empty());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(
            requests[0].url.query(),
            Some("from=2025-03-01&to=2025-03-31&vehicleIds=4&vehicleIds=7&machineryType=HEAVY")
        );
    }

    #[tokio::test]
    async fn history_skips_empty_dates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fuel/driver/d-1"))
            .and(query_param("to", "2025-03-31"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "driverId": "d-1",
                "records": [],
                "anomaliesDetected": 0,
                "anomalyRecords": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = logged_in_client(&server.uri()).await;
        let history = driver_history(&client, "d-1", Some(""), Some("2025-03-31"))
            .await
            .unwrap();
        assert_eq!(history.driver_id, "d-1");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), Some("to=2025-03-31"));
    }

    #[tokio::test]
    async fn vehicle_history_decodes_anomalies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fuel/vehicle/4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "vehicle": {"id": 4, "plate": "ABC-123", "brand": "Volvo", "model": "FH16"},
                "records": [],
                "anomaliesDetected": 1,
                "anomalyRecords": [{"recordId": "f-1", "deltaPercent": -22.5, "liters": 30.0}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = logged_in_client(&server.uri()).await;
        let history = vehicle_history(&client, 4, None, None).await.unwrap();
        assert_eq!(history.anomalies_detected, 1);
        assert_eq!(history.anomaly_records[0].delta_percent, -22.5);
    }
}
