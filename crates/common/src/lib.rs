//! Common types shared by the fleet client crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
