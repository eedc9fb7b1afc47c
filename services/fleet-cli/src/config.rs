//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults. The config file
//! itself is optional; only an explicitly requested file (`--config` or
//! `FLEET_CONFIG`) must exist.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fleet_auth::{API_URL_ENV, DEFAULT_API_BASE_URL};
use fleet_client::{ClientConfig, RetryConfig};
use serde::Deserialize;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "FLEET_CONFIG";

/// Environment variable overriding the session file location
pub const SESSION_PATH_ENV: &str = "FLEET_SESSION_PATH";

const DEFAULT_CONFIG_FILE: &str = "fleetctl.toml";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub retry: RetrySettings,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-attempt timeout
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_retries: defaults.max_retries,
            retry_delay_ms: defaults.retry_delay.as_millis() as u64,
            retryable_statuses: defaults.retryable_statuses,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.finish()
    }

    /// Resolve and load the config for this invocation.
    ///
    /// A missing file at the default location yields defaults; a missing
    /// file that was asked for explicitly is an error.
    pub fn resolve(cli_path: Option<&str>) -> common::Result<Self> {
        let explicit = cli_path.is_some() || std::env::var_os(CONFIG_PATH_ENV).is_some();
        let path = Self::resolve_path(cli_path);
        if !explicit && !path.exists() {
            return Config::default().finish();
        }
        Self::load(&path)
    }

    /// Resolve config file path from CLI arg or FLEET_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    fn finish(mut self) -> common::Result<Self> {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            self.api.base_url = url;
        }
        if let Some(path) = std::env::var_os(SESSION_PATH_ENV) {
            self.session.path = Some(PathBuf::from(path));
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> common::Result<()> {
        let url = &self.api.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(common::Error::InvalidUrl {
                url: url.clone(),
                reason: "must start with http:// or https://".into(),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.retry.retry_delay_ms == 0 {
            return Err(common::Error::Config(
                "retry_delay_ms must be greater than 0".into(),
            ));
        }

        if let Some(status) = self
            .retry
            .retryable_statuses
            .iter()
            .find(|s| !(100..=599).contains(*s))
        {
            return Err(common::Error::Config(format!(
                "retryable_statuses contains invalid HTTP status {status}"
            )));
        }

        Ok(())
    }

    /// Session file: configured path, else `$HOME/.config/fleetctl/session.json`.
    pub fn session_path(&self) -> PathBuf {
        if let Some(path) = &self.session.path {
            return path.clone();
        }
        match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home)
                .join(".config")
                .join("fleetctl")
                .join("session.json"),
            None => PathBuf::from(".fleetctl-session.json"),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            timeout: Some(Duration::from_secs(self.api.timeout_secs)),
            retry: RetryConfig::default()
                .with_max_retries(self.retry.max_retries)
                .with_retry_delay(Duration::from_millis(self.retry.retry_delay_ms))
                .with_retryable_statuses(self.retry.retryable_statuses.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn clear_env() {
        unsafe {
            remove_env(API_URL_ENV);
            remove_env(SESSION_PATH_ENV);
            remove_env(CONFIG_PATH_ENV);
        }
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("fleetctl.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_full_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[api]
base_url = "https://fleet.example.com/api"
timeout_secs = 10

[retry]
max_retries = 5
retry_delay_ms = 250
retryable_statuses = [502, 503]

[session]
path = "/tmp/fleet-session.json"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.base_url, "https://fleet.example.com/api");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.session_path(), PathBuf::from("/tmp/fleet-session.json"));

        let client = config.client_config();
        assert_eq!(client.timeout, Some(Duration::from_secs(10)));
        assert_eq!(client.retry.max_retries, 5);
        assert_eq!(client.retry.retry_delay, Duration::from_millis(250));
        assert_eq!(client.retry.retryable_statuses, vec![502, 503]);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:3000/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.retry_delay_ms, 1000);
        assert_eq!(
            config.retry.retryable_statuses,
            vec![408, 429, 500, 502, 503, 504]
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"http://file.example/api\"\n");

        unsafe {
            set_env(API_URL_ENV, "http://env.example/api");
            set_env(SESSION_PATH_ENV, "/tmp/env-session.json");
        }
        let config = Config::load(&path).unwrap();
        clear_env();

        assert_eq!(config.api.base_url, "http://env.example/api");
        assert_eq!(config.session_path(), PathBuf::from("/tmp/env-session.json"));
    }

    #[test]
    fn test_rejects_zero_timeout_and_delay() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();

        let path = write_config(&dir, "[api]\ntimeout_secs = 0\n");
        assert!(matches!(Config::load(&path), Err(common::Error::Config(_))));

        let path = write_config(&dir, "[retry]\nretry_delay_ms = 0\n");
        assert!(matches!(Config::load(&path), Err(common::Error::Config(_))));
    }

    #[test]
    fn test_rejects_bad_url_and_status() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();

        let path = write_config(&dir, "[api]\nbase_url = \"ftp://fleet\"\n");
        assert!(matches!(
            Config::load(&path),
            Err(common::Error::InvalidUrl { .. })
        ));

        let path = write_config(&dir, "[retry]\nretryable_statuses = [503, 42]\n");
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/fleetctl.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(matches!(Config::load(&path), Err(common::Error::Toml(_))));
    }

    #[test]
    fn test_resolve_path_precedence() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert_eq!(Config::resolve_path(None), PathBuf::from("fleetctl.toml"));

        unsafe { set_env(CONFIG_PATH_ENV, "/etc/fleetctl.toml") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("/etc/fleetctl.toml"));
        assert_eq!(
            Config::resolve_path(Some("/cli/fleetctl.toml")),
            PathBuf::from("/cli/fleetctl.toml")
        );
        clear_env();
    }

    #[test]
    fn test_resolve_explicit_missing_file_is_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(Config::resolve(Some("/nonexistent/fleetctl.toml")).is_err());
    }

    #[test]
    fn test_default_session_path_under_home() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = Config::default();
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(
                config.session_path(),
                PathBuf::from(home).join(".config/fleetctl/session.json")
            );
        }
    }
}
