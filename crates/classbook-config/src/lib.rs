//! # Classbook Config
//!
//! Configuration types for the Classbook API.
//!
//! This crate provides configuration structures loaded from environment variables:
//!
//! - [`jwt`]: JWT authentication configuration
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`workflow`]: assignment/solution workflow switches
//!
//! # Example
//!
//! ```ignore
//! use classbook_config::{CorsConfig, JwtConfig, WorkflowConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let workflow_config = WorkflowConfig::from_env();
//! ```

pub mod cors;
pub mod jwt;
pub mod workflow;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use workflow::WorkflowConfig;
