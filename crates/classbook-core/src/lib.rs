//! # Classbook Core
//!
//! Foundational error types used throughout the Classbook API.
//!
//! - [`rejection`]: the transport-agnostic refusal taxonomy produced by the
//!   authorization and workflow core
//! - [`errors`]: [`AppError`], the HTTP-facing error every service returns
//!
//! A [`Rejection`] converts into an [`AppError`] through `?`, picking the
//! matching status code on the way.
//!
//! # Example
//!
//! ```ignore
//! use classbook_core::{AppError, Rejection};
//!
//! fn check(grade: f64) -> Result<(), Rejection> {
//!     if grade > 100.0 {
//!         return Err(Rejection::validation("The grade must not be greater than 100."));
//!     }
//!     Ok(())
//! }
//!
//! fn handler() -> Result<(), AppError> {
//!     check(105.0)?; // becomes 422 Unprocessable Entity
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod rejection;

pub use errors::AppError;
pub use rejection::Rejection;
