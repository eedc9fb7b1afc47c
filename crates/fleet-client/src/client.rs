//! Request dispatcher
//!
//! `ApiClient::send` is the only path to the network. Each logical request
//! gets a request id, the stored bearer token, and then runs through the
//! attempt loop:
//!
//! 1. Dispatch with a per-attempt timeout.
//! 2. On the first 401 of an authenticated request, refresh once through the
//!    coordinator and replay immediately with the new token.
//! 3. Classify the outcome; retryable failures sleep with jittered
//!    exponential backoff and try again until the budget is spent.
//!
//! Exhaustion returns the last response (or the last network error), so the
//! caller always sees what the server said most recently.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fleet_auth::{DEFAULT_API_BASE_URL, TokenStore};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{ApiError, Result, normalize};
use crate::metrics;
use crate::refresh::{RefreshCoordinator, SessionState};
use crate::retry::RetryConfig;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Per-attempt timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Policy applied to requests that do not carry their own.
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            retry: RetryConfig::default(),
        }
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON. An empty body decodes as JSON `null`, so
    /// `()` and `Option<T>` targets accept 204 responses.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let decoded = if self.body.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_value(serde_json::Value::Null)
        } else {
            serde_json::from_slice(&self.body)
        };
        decoded.map_err(|e| ApiError::Decode {
            message: e.to_string(),
            status: self.status.as_u16(),
        })
    }
}

/// Description of one logical request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
    skip_auth: bool,
    retry: Option<RetryConfig>,
}

impl ApiRequest {
    /// `path` is relative to the base URL unless it is absolute.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            skip_auth: false,
            retry: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Append a query parameter. Repeating a key produces repeated params.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Serialize `body` as the JSON payload.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Request(format!("serializing body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Send `token` as the bearer credential instead of the stored access
    /// token. Implies `skip_auth`.
    pub fn bearer(self, token: &str) -> Result<Self> {
        let value = bearer_value(token)?;
        Ok(self.header(AUTHORIZATION, value).skip_auth())
    }

    /// Do not attach the stored token and never refresh on 401.
    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    pub fn is_skip_auth(&self) -> bool {
        self.skip_auth
    }

    /// Override the client's retry policy for this request.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }
}

/// Authenticated, retrying client for the fleet API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
    retry: RetryConfig,
    store: Arc<TokenStore>,
    refresher: RefreshCoordinator,
}

impl ApiClient {
    /// Build a client over `store`. The initial session state is `Active`
    /// when the store holds a complete session, `LoggedOut` otherwise.
    pub async fn new(config: ClientConfig, store: Arc<TokenStore>) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL {base_url}: {e}")))?;
        if config.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ApiError::Config("timeout must be greater than zero".into()));
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Config(format!("building HTTP client: {e}")))?;

        let initial = if store.is_authenticated().await {
            SessionState::Active
        } else {
            SessionState::LoggedOut
        };
        let refresher = RefreshCoordinator::new(http.clone(), &base_url, store.clone(), initial)
            .with_timeout(config.timeout);

        Ok(Self {
            http,
            base_url,
            timeout: config.timeout,
            retry: config.retry,
            store,
            refresher,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Receiver for session transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.refresher.subscribe()
    }

    pub fn session_state(&self) -> SessionState {
        self.refresher.state()
    }

    /// Mark the session as started after a successful login.
    pub fn session_started(&self) {
        self.refresher.transition(SessionState::Active);
    }

    /// Mark the session as ended after a logout.
    pub fn session_ended(&self) {
        self.refresher.transition(SessionState::LoggedOut);
    }

    /// Send `request` and decode a success body as `T`; failures are
    /// normalized with `default_message` as the last-resort message.
    pub async fn call<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        default_message: &str,
    ) -> Result<T> {
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(normalize(&response, default_message));
        }
        response.json()
    }

    /// Send `request` through auth, refresh and retry handling.
    ///
    /// Returns `Ok` for any received response, success or not. `Err` means
    /// no response was received, or the request could not be built.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        self.send_with_id(request, request_id).await
    }

    #[instrument(skip_all, fields(request_id = %request_id, method = %request.method, path = %request.path))]
    async fn send_with_id(&self, request: ApiRequest, request_id: String) -> Result<ApiResponse> {
        let retry = request.retry.as_ref().unwrap_or(&self.retry);
        let url = self.url(&request)?;
        let (mut headers, mut sent_token) = self.headers(&request, &request_id).await?;
        let mut refreshed = false;
        let mut attempt: u32 = 0;

        loop {
            if attempt > 0 {
                let delay = retry.delay_before(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off before retry");
                tokio::time::sleep(delay).await;
            }

            let mut outcome = self.dispatch(&request, &url, &headers).await;

            if !request.skip_auth
                && !refreshed
                && matches!(&outcome, Ok(r) if r.status() == StatusCode::UNAUTHORIZED)
            {
                refreshed = true;
                match self.refresher.refresh(sent_token.as_deref()).await {
                    Ok(token) => {
                        headers.insert(AUTHORIZATION, bearer_value(&token)?);
                        sent_token = Some(token);
                        debug!("replaying request with refreshed token");
                        outcome = self.dispatch(&request, &url, &headers).await;
                    }
                    Err(e) => {
                        debug!(error = %e, "refresh failed, surfacing original 401");
                        return outcome.map_err(|e| ApiError::network(&e));
                    }
                }
            }

            match outcome {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if !retry.should_retry_status(status, attempt) {
                        return Ok(response);
                    }
                    if attempt >= retry.max_retries {
                        warn!(status, attempts = attempt + 1, "retries exhausted");
                        return Ok(response);
                    }
                    warn!(
                        status,
                        attempt = attempt + 1,
                        max_retries = retry.max_retries,
                        "retryable status, retrying"
                    );
                    metrics::record_retry("status");
                }
                Err(e) => {
                    let cause = e.to_string();
                    if !retry.should_retry_network(&cause, attempt) || attempt >= retry.max_retries {
                        warn!(error = %e, attempts = attempt + 1, "request failed without a response");
                        return Err(ApiError::network(&e));
                    }
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        max_retries = retry.max_retries,
                        "network error, retrying"
                    );
                    metrics::record_retry("network");
                }
            }

            attempt += 1;
        }
    }

    /// One HTTP attempt. The body is buffered before returning.
    async fn dispatch(
        &self,
        request: &ApiRequest,
        url: &Url,
        headers: &HeaderMap,
    ) -> std::result::Result<ApiResponse, reqwest::Error> {
        let started = Instant::now();
        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .headers(headers.clone());
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let result = async {
            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?.to_vec();
            Ok::<_, reqwest::Error>(ApiResponse::new(status, headers, body))
        }
        .await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(response) => {
                debug!(status = response.status().as_u16(), elapsed_ms = (elapsed * 1000.0) as u64, "response received");
                metrics::record_request(request.method.as_str(), response.status().as_str(), elapsed);
            }
            Err(e) => {
                debug!(error = %e, timeout = e.is_timeout(), "request failed");
                metrics::record_request(request.method.as_str(), "error", elapsed);
            }
        }
        result
    }

    fn url(&self, request: &ApiRequest) -> Result<Url> {
        let raw = if request.path.starts_with("http://") || request.path.starts_with("https://") {
            request.path.clone()
        } else if request.path.starts_with('/') {
            format!("{}{}", self.base_url, request.path)
        } else {
            format!("{}/{}", self.base_url, request.path)
        };

        let mut url =
            Url::parse(&raw).map_err(|e| ApiError::Request(format!("invalid URL {raw}: {e}")))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    /// Initial headers, plus the access token that was attached (if any).
    async fn headers(
        &self,
        request: &ApiRequest,
        request_id: &str,
    ) -> Result<(HeaderMap, Option<String>)> {
        let mut headers = request.headers.clone();
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        let id = HeaderValue::from_str(request_id)
            .map_err(|e| ApiError::Request(format!("request id header: {e}")))?;
        headers.insert(REQUEST_ID_HEADER, id);

        if request.skip_auth {
            return Ok((headers, None));
        }
        let token = self.store.access_token().await;
        if let Some(token) = &token {
            headers.insert(AUTHORIZATION, bearer_value(token)?);
        }
        Ok((headers, token))
    }
}

fn bearer_value(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| ApiError::Request("token is not a valid header value".into()))?;
    value.set_sensitive(true);
    Ok(value)
}
