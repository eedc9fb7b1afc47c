//! Session storage and token plumbing for the fleet API client
//!
//! This crate is the leaf of the client stack: it owns the persisted
//! credentials and user profile and knows how to exchange a refresh token
//! for a new token pair. It has no knowledge of retries or request
//! dispatch; `fleet-client` builds on top of it.
//!
//! Session flow:
//! 1. Login response tokens are decoded with `jwt::decode_claims()`
//! 2. Credentials and profile are committed together via `TokenStore::set()`
//! 3. On a 401 the client calls `token::refresh_token()` once
//! 4. The new pair is committed via `TokenStore::rotate()`
//! 5. An irrecoverable refresh or logout calls `TokenStore::clear()`

pub mod constants;
pub mod error;
pub mod jwt;
pub mod store;
pub mod token;

pub use constants::*;
pub use error::{Error, Result};
pub use jwt::{Claims, decode_claims};
pub use store::{Credentials, Role, StoredUser, TokenStore};
pub use token::{TokenResponse, refresh_token};
