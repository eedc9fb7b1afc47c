//! Fleet API endpoint paths and persisted session keys
//!
//! Paths are relative to the API base URL (which already carries the `/api`
//! prefix). Storage keys name the three entries of the persisted session.

/// Base URL used when neither config nor `FLEET_API_URL` provide one
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "FLEET_API_URL";

pub const LOGIN_PATH: &str = "/auth/login";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const REQUEST_RESET_PATH: &str = "/auth/request-reset";
pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

/// Storage key for the bearer access token
pub const ACCESS_TOKEN_KEY: &str = "fleet_access_token";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "fleet_refresh_token";

/// Storage key for the serialized `StoredUser` JSON blob
pub const USER_KEY: &str = "fleet_user";
