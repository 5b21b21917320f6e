//! User data models and the closed set of roles.
//!
//! Every user carries exactly one immutable [`Role`]. Policies match on the
//! role exhaustively, so adding a variant here is a compile-time-checked change
//! across the policy engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::UserId;
use crate::value_types::{NationalId, ValueTypeError};

/// The role a user holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Manager, Role::Teacher, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manager" => Ok(Role::Manager),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(ValueTypeError::InvalidRole(format!("Invalid role: {}", other))),
        }
    }
}

/// A user in the system.
///
/// Inactive users can still authenticate and read, but no policy grants them
/// a write action.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub national_id: NationalId,
    pub role: Role,
    pub bio: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// DTO for registering a user. Only staff tooling creates users.
#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub national_id: NationalId,
    pub role: Role,
    pub bio: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// Profile edit. Only the bio is editable; a blank bio clears it.
#[derive(Deserialize, Debug, Clone, Default, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}
