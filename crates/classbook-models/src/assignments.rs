//! Assignment and solution models.
//!
//! An assignment belongs to a (lesson, class) pair; the lesson must be offered
//! by the class. A solution belongs to one assignment and one student, and
//! stays ungraded (`grade: None`) until the class teacher grades it after the
//! deadline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{AssignmentId, ClassId, LessonId, SolutionId, UserId};
use crate::value_types::{AttachmentName, Grade};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Assignment {
    pub id: AssignmentId,
    pub title: String,
    pub context: Option<String>,
    pub attachment: Option<AttachmentName>,
    pub grade_max: f64,
    pub deadline: DateTime<Utc>,
    pub answer_text: Option<String>,
    pub answer_file: Option<AttachmentName>,
    pub lesson_id: LessonId,
    pub class_id: ClassId,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl Assignment {
    pub fn has_answer(&self) -> bool {
        self.answer_text.is_some() || self.answer_file.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentState {
    /// Accepting solutions.
    Open,
    /// Deadline reached, no answer published yet.
    AwaitingAnswer,
    /// Deadline reached and the teacher published an answer.
    Answered,
}

impl AssignmentState {
    pub fn of(assignment: &Assignment, now: DateTime<Utc>) -> Self {
        if now < assignment.deadline {
            AssignmentState::Open
        } else if assignment.has_answer() {
            AssignmentState::Answered
        } else {
            AssignmentState::AwaitingAnswer
        }
    }
}

/// An assignment as returned to clients, with its lifecycle state at the
/// request time.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AssignmentResponse {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub state: AssignmentState,
}

impl AssignmentResponse {
    pub fn new(assignment: Assignment, now: DateTime<Utc>) -> Self {
        let state = AssignmentState::of(&assignment, now);
        Self { assignment, state }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Solution {
    pub id: SolutionId,
    pub context: Option<String>,
    pub attachment: Option<AttachmentName>,
    /// `None` until graded.
    pub grade: Option<Grade>,
    pub graded_at: Option<DateTime<Utc>>,
    pub student_id: UserId,
    pub assignment_id: AssignmentId,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SolutionState {
    Submitted,
    Graded,
}

impl SolutionState {
    pub fn of(solution: &Solution) -> Self {
        match solution.grade {
            Some(_) => SolutionState::Graded,
            None => SolutionState::Submitted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SolutionResponse {
    #[serde(flatten)]
    pub solution: Solution,
    pub state: SolutionState,
}

impl From<Solution> for SolutionResponse {
    fn from(solution: Solution) -> Self {
        let state = SolutionState::of(&solution);
        Self { solution, state }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAssignmentDto {
    pub class_id: ClassId,
    pub lesson_id: LessonId,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub context: Option<String>,
    pub deadline: DateTime<Utc>,
    pub attachment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAssignmentDto {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub context: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub attachment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AddAnswerDto {
    pub answer_text: Option<String>,
    pub answer_file: Option<String>,
}

/// Submission body. The student and assignment come from the request
/// context, never from the payload.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SubmitSolutionDto {
    pub context: Option<String>,
    pub attachment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateSolutionDto {
    pub context: Option<String>,
    pub attachment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GradeSolutionDto {
    pub grade: Option<f64>,
}
