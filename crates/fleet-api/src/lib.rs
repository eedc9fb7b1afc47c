//! Typed fleet API operations
//!
//! One module per backend resource. Every operation takes the shared
//! `fleet_client::ApiClient`, so auth, refresh, retries and error
//! normalization apply uniformly; this crate only knows paths, payload
//! shapes and the user-facing fallback message of each call.

pub mod auth;
pub mod drivers;
pub mod fuel;
pub mod routes;
pub mod types;
pub mod users;
pub mod vehicles;

pub use types::*;
