//! Request extractors for authentication.
//!
//! # Modules
//!
//! - [`auth`]: bearer token verification
//! - [`session`]: the live actor and the request instant
//!
//! # Authentication Flow
//!
//! 1. Client sends request with `Authorization: Bearer <token>` header
//! 2. `AuthUser` extractor validates the JWT and extracts claims
//! 3. `Session` re-reads the user and their memberships from the store and
//!    reads the clock once
//! 4. Services authorize every action against the session
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::session::Session;
//!
//! async fn get_class(
//!     State(state): State<AppState>,
//!     session: Session,
//!     Path(id): Path<ClassId>,
//! ) -> Result<Json<Class>, AppError> {
//!     let class = ClassService::get_class(state.store.as_ref(), &session, id).await?;
//!     Ok(Json(class))
//! }
//! ```

pub mod auth;
pub mod session;
