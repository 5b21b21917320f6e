use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{ClassId, NewsId, SchoolId, UserId};

/// A news item. Exactly one of `school_id` / `class_id` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct News {
    pub id: NewsId,
    pub title: String,
    pub context: String,
    pub creator_id: UserId,
    pub school_id: Option<SchoolId>,
    pub class_id: Option<ClassId>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateNewsDto {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub context: String,
    pub school_id: Option<SchoolId>,
    pub class_id: Option<ClassId>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateNewsDto {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub context: Option<String>,
}
