//! Common error types

use thiserror::Error;

/// Configuration and bootstrap errors shared across the workspace
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_the_problem() {
        let err = Error::Config("retry_delay_ms must be greater than 0".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: retry_delay_ms must be greater than 0"
        );
    }

    #[test]
    fn invalid_url_includes_url_and_reason() {
        let err = Error::InvalidUrl {
            url: "localhost:3000".into(),
            reason: "missing http(s) scheme".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("localhost:3000"), "got: {msg}");
        assert!(msg.contains("missing http(s) scheme"), "got: {msg}");
    }

    #[test]
    fn io_error_converts_with_question_mark() {
        fn read_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/fleetctl.toml")?)
        }
        let err = read_missing().unwrap_err();
        assert!(matches!(err, Error::Io(_)), "got: {err:?}");
    }
}
