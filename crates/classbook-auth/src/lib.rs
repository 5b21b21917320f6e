//! # Classbook Auth
//!
//! JWT access tokens for the Classbook API.
//!
//! - [`claims`]: the [`Claims`] carried by every access token
//! - [`jwt`]: token creation and verification
//!
//! Tokens identify the actor only. What the actor may do is decided by the
//! policy engine in `classbook-authz` against live store state.

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
