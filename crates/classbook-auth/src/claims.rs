//! JWT claim structure for access tokens.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use classbook_models::{Role, UserId};

/// JWT claims for access tokens.
///
/// The role is embedded for logging and cheap rejection only. Authorization
/// always re-reads the user from the store, so a deactivated user loses write
/// access before their token expires.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: UserId,
    pub role: Role,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}
