//! Single-flight access token refresh
//!
//! Any number of requests may hit a 401 at once; only one refresh call goes
//! out. The first caller installs a shared future in the in-flight slot and
//! every later caller awaits the same future. The slot is cleared once the
//! refresh settles, so the next expiry starts a new refresh.
//!
//! Session transitions are broadcast on a `watch` channel:
//! `Active -> Refreshing -> Active` on success and
//! `Refreshing -> LoggedOut` when the refresh token is rejected or missing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use fleet_auth::TokenStore;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::metrics;

/// Observable session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Refreshing,
    /// Terminal until the next successful login.
    LoggedOut,
}

type RefreshOutcome = Result<String, fleet_auth::Error>;

struct InFlight {
    generation: u64,
    refresh: Shared<BoxFuture<'static, RefreshOutcome>>,
}

pub struct RefreshCoordinator {
    http: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
    store: Arc<TokenStore>,
    session: Arc<watch::Sender<SessionState>>,
    in_flight: Mutex<Option<InFlight>>,
    generation: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        store: Arc<TokenStore>,
        initial: SessionState,
    ) -> Self {
        let (session, _) = watch::channel(initial);
        Self {
            http,
            base_url: base_url.into(),
            timeout: None,
            store,
            session: Arc::new(session),
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Bound each refresh exchange. A refresh that times out fails like a
    /// rejected one.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    pub fn state(&self) -> SessionState {
        *self.session.borrow()
    }

    /// Move to `state`, notifying subscribers only on an actual change.
    pub fn transition(&self, state: SessionState) {
        set_state(&self.session, state);
    }

    /// Obtain a fresh access token.
    ///
    /// `rejected` is the token the caller's 401 was issued for. When the
    /// store already holds a different token, another caller has refreshed
    /// in the meantime and that token is returned without a new call.
    pub async fn refresh(&self, rejected: Option<&str>) -> RefreshOutcome {
        let (generation, refresh) = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some(current) => {
                    debug!(generation = current.generation, "joining in-flight token refresh");
                    (current.generation, current.refresh.clone())
                }
                None => {
                    if let Some(current) = self.store.access_token().await
                        && rejected.is_some_and(|token| token != current)
                    {
                        debug!("token already rotated by a concurrent refresh");
                        return Ok(current);
                    }

                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let refresh = run_refresh(
                        self.http.clone(),
                        self.base_url.clone(),
                        self.timeout,
                        self.store.clone(),
                        self.session.clone(),
                    )
                    .boxed()
                    .shared();
                    set_state(&self.session, SessionState::Refreshing);
                    *slot = Some(InFlight {
                        generation,
                        refresh: refresh.clone(),
                    });
                    (generation, refresh)
                }
            }
        };

        let outcome = refresh.await;

        let mut slot = self.in_flight.lock().await;
        if slot
            .as_ref()
            .is_some_and(|current| current.generation == generation)
        {
            *slot = None;
        }
        outcome
    }
}

async fn run_refresh(
    http: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
    store: Arc<TokenStore>,
    session: Arc<watch::Sender<SessionState>>,
) -> RefreshOutcome {
    let result = async {
        let refresh = store
            .refresh_token()
            .await
            .ok_or(fleet_auth::Error::MissingRefreshToken)?;
        let tokens = fleet_auth::refresh_token(&http, &base_url, &refresh, timeout).await?;
        let credentials = tokens.into_credentials();
        if let Err(e) = store.rotate(&credentials).await {
            warn!(error = %e, "failed to persist refreshed tokens");
        }
        Ok::<_, fleet_auth::Error>(credentials.access_token.expose().clone())
    }
    .await;

    match &result {
        Ok(_) => {
            info!("access token refreshed");
            metrics::record_refresh("success");
            set_state(&session, SessionState::Active);
        }
        Err(e) => {
            warn!(error = %e, "token refresh failed, ending session");
            if let Err(e) = store.clear().await {
                warn!(error = %e, "failed to clear session after refresh failure");
            }
            metrics::record_refresh("failure");
            set_state(&session, SessionState::LoggedOut);
        }
    }
    result
}

fn set_state(session: &watch::Sender<SessionState>, next: SessionState) {
    session.send_if_modified(|state| {
        if *state == next {
            false
        } else {
            debug!(from = ?*state, to = ?next, "session state changed");
            *state = next;
            true
        }
    });
}
