//! The persistence seam.

use async_trait::async_trait;

use classbook_core::AppError;
use classbook_models::{
    AssignmentId, ClassId, Lesson, LessonId, NationalId, School, SchoolId, User, UserId,
};

use crate::commit::{Committed, Plan};
use crate::identity::ActorContext;
use crate::relationship::{Chain, ResourceRef};

/// Candidate sets for listings. Callers filter the returned chains through
/// the policy engine; a scan only bounds the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    ClassesInSchools(Vec<SchoolId>),
    AssignmentsInClasses(Vec<ClassId>),
    SolutionsInClasses(Vec<ClassId>),
    SolutionsOfAssignment(AssignmentId),
    NewsInSchools(Vec<SchoolId>),
}

/// Storage backend for the authorization core.
///
/// Reads return `Ok(None)` for missing entities. [`Store::commit`] must
/// verify the plan's preconditions and apply its mutation atomically,
/// against the freshest committed state.
#[async_trait]
pub trait Store: Send + Sync {
    async fn actor(&self, user_id: UserId) -> Result<Option<ActorContext>, AppError>;

    async fn load(&self, target: ResourceRef) -> Result<Option<Chain>, AppError>;

    async fn scan(&self, scan: Scan) -> Result<Vec<Chain>, AppError>;

    async fn users(&self, ids: &[UserId]) -> Result<Vec<User>, AppError>;

    async fn user(&self, id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.users(&[id]).await?.pop())
    }

    async fn student_by_national_id(
        &self,
        national_id: &NationalId,
    ) -> Result<Option<User>, AppError>;

    async fn lessons(&self, ids: &[LessonId]) -> Result<Vec<Lesson>, AppError>;

    async fn lesson_by_name(&self, name: &str) -> Result<Option<Lesson>, AppError>;

    async fn commit(&self, plan: Plan) -> Result<Committed, AppError>;

    /// Provisioning: registers a user. Fails with a conflict on a duplicate
    /// username, email or national id.
    async fn insert_user(&self, user: User) -> Result<User, AppError>;

    /// Provisioning: registers a school. Fails with a conflict if the
    /// manager already runs another school.
    async fn insert_school(&self, school: School) -> Result<School, AppError>;

    /// Provisioning: activates or deactivates an account. An inactive user
    /// keeps read access but every mutation is refused.
    async fn set_user_active(&self, user_id: UserId, active: bool) -> Result<User, AppError>;
}
