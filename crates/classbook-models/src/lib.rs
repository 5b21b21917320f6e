//! # Classbook Models
//!
//! Domain models and DTOs for the Classbook API.
//!
//! # Modules
//!
//! - [`ids`]: one `Uuid` newtype per entity
//! - [`value_types`]: validated primitives (national id, grade, attachment)
//! - [`users`]: users and the closed [`Role`] set
//! - [`schools`]: schools, classes and lessons
//! - [`assignments`]: assignments and solutions
//! - [`news`]: school- and class-scoped news
//!
//! # Example
//!
//! ```ignore
//! use classbook_models::{Grade, Role, Solution};
//!
//! let grade = Grade::new(80.0)?;
//! assert_eq!(Role::Teacher.as_str(), "teacher");
//! ```

pub mod assignments;
pub mod ids;
pub mod news;
pub mod schools;
pub mod users;
pub mod value_types;

// Re-export commonly used types at crate root for convenience
pub use assignments::{
    AddAnswerDto, Assignment, AssignmentResponse, AssignmentState, CreateAssignmentDto,
    GradeSolutionDto, Solution, SolutionResponse, SolutionState, SubmitSolutionDto,
    UpdateAssignmentDto, UpdateSolutionDto,
};
pub use ids::{AssignmentId, ClassId, LessonId, NewsId, SchoolId, SolutionId, UserId};
pub use news::{CreateNewsDto, News, UpdateNewsDto};
pub use schools::{
    AddLessonDto, Class, CreateClassDto, CreateSchoolDto, Lesson, MessageResponse, School,
    StudentMembershipDto, UpdateClassDto,
};
pub use users::{CreateUserDto, Role, UpdateProfileDto, User};
pub use value_types::{AttachmentName, Grade, NationalId, ValueTypeError};
