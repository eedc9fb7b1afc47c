//! Resilient HTTP client for the fleet API
//!
//! Wraps `reqwest` with the behaviour every feature call needs:
//! bearer auth from the `fleet_auth::TokenStore`, a single-flight refresh
//! when the access token expires, retries with jittered exponential backoff,
//! and error bodies normalized into `ApiError`.
//!
//! Feature modules build an `ApiRequest` and hand it to `ApiClient::call`,
//! which decodes success bodies and normalizes failures.

pub mod client;
pub mod error;
pub mod metrics;
pub mod refresh;
pub mod retry;

pub use client::{ApiClient, ApiRequest, ApiResponse, ClientConfig, DEFAULT_TIMEOUT, REQUEST_ID_HEADER};
pub use error::{ApiError, NETWORK_ERROR_MESSAGE, Result, clean_message, normalize};
pub use refresh::{RefreshCoordinator, SessionState};
pub use retry::{RetryCause, RetryConfig, backoff_delay};
