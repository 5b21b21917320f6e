//! Commit plans.
//!
//! A [`Plan`] is a validated mutation plus the gates it was admitted under,
//! restated as [`Precondition`]s. A store reads each precondition's [`Fact`]
//! from its freshest committed state inside the same critical section that
//! applies the mutation, and refuses the plan if any fact has drifted.

use anyhow::anyhow;
use chrono::{DateTime, Utc};

use classbook_core::{AppError, Rejection};
use classbook_models::{
    Assignment, AssignmentId, Class, ClassId, Grade, Lesson, LessonId, News, NewsId, SchoolId,
    Solution, SolutionId, User, UserId,
};

use crate::membership;
use crate::policy::Policy;
use crate::relationship::{Relationship, ResourceKind, ResourceRef};
use crate::workflow::{Answer, AssignmentChanges, DeadlineWindow, SolutionBody};

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateClass(Class),
    UpdateClass {
        class_id: ClassId,
        name: Option<String>,
        teacher_id: Option<UserId>,
    },
    DeleteClass {
        class_id: ClassId,
    },
    AddStudent {
        class_id: ClassId,
        student_id: UserId,
    },
    RemoveStudent {
        class_id: ClassId,
        student_id: UserId,
    },
    /// Adds the lesson with this name, creating the catalog entry if needed.
    AddLesson {
        class_id: ClassId,
        name: String,
    },
    CreateAssignment(Assignment),
    UpdateAssignment {
        assignment_id: AssignmentId,
        changes: AssignmentChanges,
    },
    AddAnswer {
        assignment_id: AssignmentId,
        answer: Answer,
    },
    SubmitSolution(Solution),
    UpdateSolution {
        solution_id: SolutionId,
        body: SolutionBody,
    },
    GradeSolution {
        solution_id: SolutionId,
        grade: Grade,
    },
    CreateNews(News),
    UpdateNews {
        news_id: NewsId,
        title: Option<String>,
        context: Option<String>,
    },
    DeleteNews {
        news_id: NewsId,
    },
    /// Replaces the actor's bio; `None` clears it.
    UpdateProfile {
        user_id: UserId,
        bio: Option<String>,
    },
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::CreateClass(_) => "create_class",
            Mutation::UpdateClass { .. } => "update_class",
            Mutation::DeleteClass { .. } => "delete_class",
            Mutation::AddStudent { .. } => "add_student",
            Mutation::RemoveStudent { .. } => "remove_student",
            Mutation::AddLesson { .. } => "add_lesson",
            Mutation::CreateAssignment(_) => "create_assignment",
            Mutation::UpdateAssignment { .. } => "update_assignment",
            Mutation::AddAnswer { .. } => "add_answer",
            Mutation::SubmitSolution(_) => "submit_solution",
            Mutation::UpdateSolution { .. } => "update_solution",
            Mutation::GradeSolution { .. } => "grade_solution",
            Mutation::CreateNews(_) => "create_news",
            Mutation::UpdateNews { .. } => "update_news",
            Mutation::DeleteNews { .. } => "delete_news",
            Mutation::UpdateProfile { .. } => "update_profile",
        }
    }
}

/// The state a store hands back after applying a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Committed {
    Class(Class),
    Lesson(Lesson),
    Assignment(Assignment),
    Solution(Solution),
    News(News),
    User(User),
    Deleted,
}

fn unexpected(expected: &str, got: &Committed) -> AppError {
    AppError::internal(anyhow!("Store committed {:?} where {} was expected", got, expected))
}

impl Committed {
    pub fn into_class(self) -> Result<Class, AppError> {
        match self {
            Committed::Class(class) => Ok(class),
            other => Err(unexpected("a class", &other)),
        }
    }

    pub fn into_lesson(self) -> Result<Lesson, AppError> {
        match self {
            Committed::Lesson(lesson) => Ok(lesson),
            other => Err(unexpected("a lesson", &other)),
        }
    }

    pub fn into_assignment(self) -> Result<Assignment, AppError> {
        match self {
            Committed::Assignment(assignment) => Ok(assignment),
            other => Err(unexpected("an assignment", &other)),
        }
    }

    pub fn into_solution(self) -> Result<Solution, AppError> {
        match self {
            Committed::Solution(solution) => Ok(solution),
            other => Err(unexpected("a solution", &other)),
        }
    }

    pub fn into_news(self) -> Result<News, AppError> {
        match self {
            Committed::News(news) => Ok(news),
            other => Err(unexpected("a news item", &other)),
        }
    }

    pub fn into_user(self) -> Result<User, AppError> {
        match self {
            Committed::User(user) => Ok(user),
            other => Err(unexpected("a user", &other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    ActorActive(UserId),
    ClassTeacher {
        class_id: ClassId,
        user_id: UserId,
    },
    ClassStudent {
        class_id: ClassId,
        user_id: UserId,
    },
    SchoolManager {
        school_id: SchoolId,
        user_id: UserId,
    },
    StudentMembership {
        class_id: ClassId,
        student_id: UserId,
        expect_member: bool,
    },
    LessonOffered {
        class_id: ClassId,
        lesson_id: LessonId,
    },
    LessonNameFree {
        class_id: ClassId,
        name: String,
    },
    Deadline {
        assignment_id: AssignmentId,
        window: DeadlineWindow,
    },
    SolutionAuthor {
        solution_id: SolutionId,
        student_id: UserId,
    },
    /// The student holds no solution for the assignment yet.
    SingleSubmission {
        assignment_id: AssignmentId,
        student_id: UserId,
    },
    Exists(ResourceRef),
}

/// A precondition's input as read from committed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fact {
    Holds(bool),
    Deadline(DateTime<Utc>),
    Count(usize),
    Missing(ResourceKind),
}

impl Precondition {
    pub fn check(&self, fact: &Fact, now: DateTime<Utc>) -> Result<(), Rejection> {
        use Precondition::*;

        match (self, fact) {
            (_, Fact::Missing(kind)) => Err(Rejection::not_found(format!("{} not found.", kind))),

            (StudentMembership { expect_member, .. }, Fact::Holds(is_member)) => {
                match (*expect_member, *is_member) {
                    (true, false) => Err(membership::not_member()),
                    (false, true) => Err(membership::already_member()),
                    _ => Ok(()),
                }
            }
            (LessonNameFree { .. }, Fact::Holds(true)) => Err(membership::lesson_already_offered()),
            (LessonNameFree { .. }, Fact::Holds(false)) => Ok(()),

            (_, Fact::Holds(true)) => Ok(()),
            (ActorActive(_), Fact::Holds(false)) => Err(Rejection::denied(Policy::Active.reason())),
            (ClassTeacher { .. }, Fact::Holds(false)) => Err(denied(Relationship::TeacherOf)),
            (ClassStudent { .. }, Fact::Holds(false)) => Err(denied(Relationship::StudentOf)),
            (SchoolManager { .. }, Fact::Holds(false)) => Err(denied(Relationship::ManagerOf)),
            (SolutionAuthor { .. }, Fact::Holds(false)) => Err(denied(Relationship::Creator)),
            (LessonOffered { .. }, Fact::Holds(false)) => Err(Rejection::invalid_transition(
                "This lesson does not belong to this class.",
            )),
            (Exists(target), Fact::Holds(false)) => {
                Err(Rejection::not_found(format!("{} not found.", target.kind())))
            }

            (Deadline { window, .. }, Fact::Deadline(deadline)) => window.check(now, *deadline),

            (SingleSubmission { .. }, Fact::Count(0)) => Ok(()),
            (SingleSubmission { .. }, Fact::Count(_)) => Err(Rejection::conflict(
                "You have already submitted a solution for this assignment.",
            )),

            _ => Err(Rejection::conflict(
                "The resource changed while the request was processed.",
            )),
        }
    }
}

fn denied(relationship: Relationship) -> Rejection {
    Rejection::denied(Policy::Has(relationship).reason())
}

/// A mutation together with everything that must still hold when it lands.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub actor: Option<UserId>,
    pub mutation: Mutation,
    pub preconditions: Vec<Precondition>,
    /// The request's instant, stamped on whatever the mutation writes.
    /// Deadline preconditions are checked against the store's own clock.
    pub now: DateTime<Utc>,
}

impl Plan {
    /// A plan on behalf of an actor, who must still be active at commit.
    pub fn new(actor: UserId, mutation: Mutation, now: DateTime<Utc>) -> Self {
        Self {
            actor: Some(actor),
            mutation,
            preconditions: vec![Precondition::ActorActive(actor)],
            now,
        }
    }

    /// A provisioning plan that bypasses the policy engine.
    pub fn staff(mutation: Mutation, now: DateTime<Utc>) -> Self {
        Self {
            actor: None,
            mutation,
            preconditions: Vec::new(),
            now,
        }
    }

    pub fn require(mut self, precondition: Precondition) -> Self {
        self.preconditions.push(precondition);
        self
    }

    /// Checks every precondition against facts supplied by the caller, in
    /// order, stopping at the first one that no longer holds. `at` is the
    /// instant read inside the commit's critical section.
    pub fn verify<F>(&self, at: DateTime<Utc>, mut fact_of: F) -> Result<(), Rejection>
    where
        F: FnMut(&Precondition) -> Fact,
    {
        for precondition in &self.preconditions {
            precondition.check(&fact_of(precondition), at)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    #[test]
    fn test_membership_preconditions() {
        let world = World::new();
        let adding = Precondition::StudentMembership {
            class_id: world.class.id,
            student_id: world.student.id,
            expect_member: false,
        };
        assert!(adding.check(&Fact::Holds(false), deadline()).is_ok());
        assert_eq!(
            adding.check(&Fact::Holds(true), deadline()).unwrap_err(),
            Rejection::conflict("The student was already in this class.")
        );

        let removing = Precondition::StudentMembership {
            class_id: world.class.id,
            student_id: world.student.id,
            expect_member: true,
        };
        assert!(removing.check(&Fact::Holds(true), deadline()).is_ok());
        assert!(matches!(
            removing.check(&Fact::Holds(false), deadline()),
            Err(Rejection::Conflict(_))
        ));
    }

    #[test]
    fn test_deadline_rechecked_with_commit_time() {
        let world = World::new();
        let pre = Precondition::Deadline {
            assignment_id: world.assignment.id,
            window: DeadlineWindow::Before,
        };
        // the deadline moved earlier after the request was admitted
        let moved = Fact::Deadline(before_deadline() - chrono::Duration::seconds(5));
        assert!(matches!(
            pre.check(&moved, before_deadline()),
            Err(Rejection::InvalidTransition(_))
        ));
        assert!(pre.check(&Fact::Deadline(deadline()), before_deadline()).is_ok());
    }

    #[test]
    fn test_missing_entity_is_not_found() {
        let world = World::new();
        let pre = Precondition::ClassTeacher {
            class_id: world.class.id,
            user_id: world.teacher.id,
        };
        assert_eq!(
            pre.check(&Fact::Missing(ResourceKind::Class), deadline()).unwrap_err(),
            Rejection::not_found("Class not found.")
        );
        assert_eq!(
            pre.check(&Fact::Holds(false), deadline()).unwrap_err(),
            Rejection::denied("You are not the teacher of this class.")
        );
    }

    #[test]
    fn test_single_submission() {
        let world = World::new();
        let pre = Precondition::SingleSubmission {
            assignment_id: world.assignment.id,
            student_id: world.student.id,
        };
        assert!(pre.check(&Fact::Count(0), deadline()).is_ok());
        assert!(matches!(
            pre.check(&Fact::Count(1), deadline()),
            Err(Rejection::Conflict(_))
        ));
    }

    #[test]
    fn test_plan_stops_at_first_failure() {
        let world = World::new();
        let plan = Plan::new(
            world.teacher.id,
            Mutation::DeleteClass {
                class_id: world.class.id,
            },
            before_deadline(),
        )
        .require(Precondition::ClassTeacher {
            class_id: world.class.id,
            user_id: world.teacher.id,
        });

        let mut seen = 0;
        let err = plan
            .verify(before_deadline(), |_| {
                seen += 1;
                Fact::Holds(false)
            })
            .unwrap_err();
        assert_eq!(seen, 1);
        assert_eq!(err, Rejection::denied("Your account is inactive."));

        assert!(plan.verify(before_deadline(), |_| Fact::Holds(true)).is_ok());
    }

    #[test]
    fn test_plan_admitted_before_deadline_refused_after_it() {
        let world = World::new();
        let plan = Plan::new(
            world.student.id,
            Mutation::UpdateSolution {
                solution_id: world.solution.id,
                body: SolutionBody {
                    context: Some("Second draft".to_string()),
                    attachment: None,
                },
            },
            before_deadline(),
        )
        .require(Precondition::Deadline {
            assignment_id: world.assignment.id,
            window: DeadlineWindow::Before,
        });
        let facts = |precondition: &Precondition| match precondition {
            Precondition::Deadline { .. } => Fact::Deadline(deadline()),
            _ => Fact::Holds(true),
        };

        assert!(plan.verify(before_deadline(), facts).is_ok());
        assert_eq!(
            plan.verify(after_deadline(), facts).unwrap_err(),
            Rejection::invalid_transition("The assignment deadline has passed.")
        );
    }
}
