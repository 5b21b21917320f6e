//! Schools, classes and the lesson catalog.
//!
//! A [`Class`] belongs to exactly one school and carries its membership sets
//! (students and lessons) inline, so one load answers every membership
//! question a policy can ask about it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{ClassId, LessonId, SchoolId, UserId};

/// A school. At most one manager, and a manager runs at most one school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    pub manager_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// A named lesson. Lessons are shared between classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Lesson {
    pub id: LessonId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    pub school_id: SchoolId,
    pub teacher_id: Option<UserId>,
    pub student_ids: Vec<UserId>,
    pub lesson_ids: Vec<LessonId>,
    pub created_at: DateTime<Utc>,
}

impl Class {
    pub fn has_student(&self, user_id: UserId) -> bool {
        self.student_ids.contains(&user_id)
    }

    pub fn has_lesson(&self, lesson_id: LessonId) -> bool {
        self.lesson_ids.contains(&lesson_id)
    }

    pub fn is_taught_by(&self, user_id: UserId) -> bool {
        self.teacher_id == Some(user_id)
    }
}

/// Staff-side DTO for creating a school.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSchoolDto {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub manager_id: Option<UserId>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateClassDto {
    pub school_id: SchoolId,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub teacher_id: Option<UserId>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateClassDto {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub teacher_id: Option<UserId>,
}

/// Body of `add-student` / `remove-student`. The id is parsed by the
/// membership guard so that format errors surface as validation errors.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StudentMembershipDto {
    pub national_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddLessonDto {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub detail: String,
}

impl MessageResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
