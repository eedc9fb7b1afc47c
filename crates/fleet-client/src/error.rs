//! Normalized API errors
//!
//! Every failure leaving the client is an `ApiError`. Backend error bodies
//! come in several shapes (`{message}`, `{message: [..]}`, `{error}`, raw
//! gRPC status strings forwarded by the gateway), and `normalize` folds them
//! into one cleaned message plus the status code and the parsed body.

use std::sync::LazyLock;

use regex::Regex;

use crate::client::ApiResponse;

/// Message surfaced for failures where no response was received.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

/// `"<code> <STATUS_TAG>: <detail>"`, as produced by gRPC status strings.
static STATUS_TAG_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*\d+\s+[A-Z][A-Z_]*:\s*(.+)$").expect("status tag pattern is valid")
});

/// Errors returned by the fleet API client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, timeout).
    #[error("{message}")]
    Network { message: String, cause: String },

    /// The server answered with a non-success status.
    #[error("{message}")]
    Http {
        message: String,
        status: u16,
        body: Option<serde_json::Value>,
    },

    /// A success response whose body did not match the expected shape.
    #[error("invalid response body: {message}")]
    Decode { message: String, status: u16 },

    /// The request could not be built (bad header value, unserializable body).
    #[error("invalid request: {0}")]
    Request(String),

    /// Client construction failed.
    #[error("client configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub(crate) fn network(err: &reqwest::Error) -> Self {
        ApiError::Network {
            message: NETWORK_ERROR_MESSAGE.to_string(),
            cause: err.to_string(),
        }
    }

    /// User-facing message.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Network { message, .. }
            | ApiError::Http { message, .. }
            | ApiError::Decode { message, .. } => message,
            ApiError::Request(message) | ApiError::Config(message) => message,
        }
    }

    /// HTTP status; `0` when no response was received, `None` when no
    /// request was sent.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Network { .. } => Some(0),
            ApiError::Http { status, .. } | ApiError::Decode { status, .. } => Some(*status),
            ApiError::Request(_) | ApiError::Config(_) => None,
        }
    }

    /// Parsed error body, kept for diagnostics.
    pub fn original(&self) -> Option<&serde_json::Value> {
        match self {
            ApiError::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Convert a non-success response into an `ApiError::Http`.
///
/// Message resolution: body `message`, then body `error`, then the status
/// reason phrase, then `default_message`. A body that is not JSON is not an
/// error here; it simply yields no message.
pub fn normalize(response: &ApiResponse, default_message: &str) -> ApiError {
    let body: Option<serde_json::Value> = serde_json::from_slice(response.body()).ok();

    let message = body
        .as_ref()
        .and_then(extract_message)
        .or_else(|| {
            response
                .status()
                .canonical_reason()
                .map(str::to_string)
        })
        .unwrap_or_else(|| default_message.to_string());

    ApiError::Http {
        message: clean_message(&message),
        status: response.status().as_u16(),
        body,
    }
}

fn extract_message(body: &serde_json::Value) -> Option<String> {
    let text = |value: &serde_json::Value| -> Option<String> {
        match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            // Validation pipes report one message per failed constraint
            serde_json::Value::Array(items) => {
                let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
                (!parts.is_empty()).then(|| parts.join("; "))
            }
            serde_json::Value::Object(inner) => inner
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            _ => None,
        }
    };

    body.get("message")
        .and_then(text)
        .or_else(|| body.get("error").and_then(text))
}

/// Strip transport noise from a backend message.
///
/// `"9 FAILED_PRECONDITION: Driver already has a route"` becomes
/// `"Driver already has a route"`. Other colon-separated messages keep the
/// last segment longer than five characters. Anything else is returned
/// unchanged.
pub fn clean_message(message: &str) -> String {
    if let Some(detail) = STATUS_TAG_PREFIX
        .captures(message)
        .and_then(|caps| caps.get(1))
    {
        return detail.as_str().trim().to_string();
    }

    if message.contains(':')
        && let Some(segment) = message
            .rsplit(':')
            .map(str::trim)
            .find(|segment| segment.chars().count() > 5)
    {
        return segment.to_string();
    }

    message.to_string()
}
