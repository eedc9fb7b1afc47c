//! Persisted session storage
//!
//! Holds the access token, refresh token and user profile as three string
//! entries, optionally mirrored to a JSON file. All writes go through one
//! tokio Mutex and commit every affected key at once, so a reader never
//! observes a half-swapped token pair. Reads never fail: a missing key, an
//! unparseable user blob or an unreadable file all read as `None`.
//!
//! File writes use atomic temp-file + rename with 0600 permissions since the
//! file contains bearer tokens.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use common::Secret;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};
use crate::error::{Error, Result};

/// Access/refresh token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Secret<String>,
    pub refresh_token: Secret<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
            refresh_token: Secret::new(refresh_token.into()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &self.access_token)
            .field("refresh_token", &self.refresh_token)
            .finish()
    }
}

/// Fleet role carried in the access token and the user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Driver,
    Dispatcher,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Driver => "DRIVER",
            Role::Dispatcher => "DISPATCHER",
        }
    }
}

/// User profile decoded from the access token at login time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
}

/// Session store for credentials and the user profile.
///
/// `path == None` keeps everything in process memory only.
pub struct TokenStore {
    path: Option<PathBuf>,
    state: Mutex<HashMap<String, String>>,
}

impl TokenStore {
    /// Store without persistence; entries live for the process lifetime.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Load the session file at `path`.
    ///
    /// Never fails: a missing file starts empty, and an unreadable or
    /// corrupt file is logged and treated as empty (the next write replaces
    /// it).
    pub async fn load(path: PathBuf) -> Self {
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<HashMap<String, String>>(&contents) {
                Ok(entries) => {
                    info!(path = %path.display(), entries = entries.len(), "loaded session");
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "session file is corrupt, starting logged out");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no session file, starting logged out");
                HashMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "session file unreadable, starting logged out");
                HashMap::new()
            }
        };

        Self {
            path: Some(path),
            state: Mutex::new(state),
        }
    }

    /// Path of the backing file, if persisted.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state.lock().await.get(ACCESS_TOKEN_KEY).cloned()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.state.lock().await.get(REFRESH_TOKEN_KEY).cloned()
    }

    /// Stored user profile; `None` when absent or when the blob does not parse.
    pub async fn user(&self) -> Option<StoredUser> {
        let state = self.state.lock().await;
        let blob = state.get(USER_KEY)?;
        match serde_json::from_str(blob) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(error = %e, "stored user blob does not parse");
                None
            }
        }
    }

    /// Both tokens, read under a single lock.
    pub async fn credentials(&self) -> Option<Credentials> {
        let state = self.state.lock().await;
        let access = state.get(ACCESS_TOKEN_KEY)?;
        let refresh = state.get(REFRESH_TOKEN_KEY)?;
        Some(Credentials::new(access.clone(), refresh.clone()))
    }

    /// Whether a complete session (both tokens and a profile) is stored.
    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.lock().await;
        [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY]
            .iter()
            .all(|key| state.contains_key(*key))
    }

    /// Commit a fresh session: both tokens and the profile in one write.
    pub async fn set(&self, credentials: &Credentials, user: &StoredUser) -> Result<()> {
        let user_blob = serde_json::to_string(user)
            .map_err(|e| Error::Serialize(format!("serializing user: {e}")))?;

        let mut state = self.state.lock().await;
        state.insert(
            ACCESS_TOKEN_KEY.to_string(),
            credentials.access_token.expose().clone(),
        );
        state.insert(
            REFRESH_TOKEN_KEY.to_string(),
            credentials.refresh_token.expose().clone(),
        );
        state.insert(USER_KEY.to_string(), user_blob);
        debug!(user_id = %user.id, "session stored");
        self.persist(&state).await
    }

    /// Swap in a refreshed token pair, keeping the stored profile.
    pub async fn rotate(&self, credentials: &Credentials) -> Result<()> {
        let mut state = self.state.lock().await;
        state.insert(
            ACCESS_TOKEN_KEY.to_string(),
            credentials.access_token.expose().clone(),
        );
        state.insert(
            REFRESH_TOKEN_KEY.to_string(),
            credentials.refresh_token.expose().clone(),
        );
        debug!("tokens rotated");
        self.persist(&state).await
    }

    /// Remove tokens and profile together.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.remove(ACCESS_TOKEN_KEY);
        state.remove(REFRESH_TOKEN_KEY);
        state.remove(USER_KEY);
        debug!("session cleared");
        self.persist(&state).await
    }

    async fn persist(&self, state: &HashMap<String, String>) -> Result<()> {
        match &self.path {
            Some(path) => write_atomic(path, state).await,
            None => Ok(()),
        }
    }
}

/// Write the session map to a file atomically.
///
/// Writes a temporary file next to the target, then renames it over the
/// target so a crash mid-write leaves the previous session intact.
async fn write_atomic(path: &Path, data: &HashMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Serialize(format!("serializing session: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("session path has no parent directory".into()))?;

    if !dir.as_os_str().is_empty() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::Io(format!("creating session directory: {e}")))?;
    }

    let tmp_path = dir.join(format!(".session.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting session file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp session file: {e}")))?;

    debug!(path = %path.display(), "persisted session");
    Ok(())
}
