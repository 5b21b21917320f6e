//! Assignment and solution lifecycles.
//!
//! ```text
//! Assignment:  Open ──(deadline)──> AwaitingAnswer ──add_answer──> Answered
//! Solution:    Submitted ──grade (after deadline)──> Graded ──grade──> Graded
//! ```
//!
//! Every transition is a pure function of the current entity, the request
//! payload and the request's single `now`. Each returns the validated change
//! or the [`Rejection`] that stops it; nothing is written here.

use chrono::{DateTime, Utc};

use classbook_core::Rejection;
use classbook_models::{
    AddAnswerDto, Assignment, AttachmentName, Class, CreateAssignmentDto, Grade,
    GradeSolutionDto, LessonId, Solution, SubmitSolutionDto, UpdateAssignmentDto,
    UpdateSolutionDto,
};

pub use classbook_models::{AssignmentState, SolutionState};

/// Fixed maximum score of every assignment.
pub const GRADE_MAX: f64 = 100.0;

/// Which side of an assignment deadline an action needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeadlineWindow {
    /// `now < deadline`: submitting or editing work, editing the assignment.
    Before,
    /// `now >= deadline`: publishing the answer.
    AtOrAfter,
    /// `now > deadline`: grading.
    After,
}

impl DeadlineWindow {
    pub fn admits(&self, now: DateTime<Utc>, deadline: DateTime<Utc>) -> bool {
        match self {
            DeadlineWindow::Before => now < deadline,
            DeadlineWindow::AtOrAfter => now >= deadline,
            DeadlineWindow::After => now > deadline,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            DeadlineWindow::Before => "The assignment deadline has passed.",
            DeadlineWindow::AtOrAfter => "The assignment deadline has not passed yet.",
            DeadlineWindow::After => "Solutions can only be graded after the assignment deadline.",
        }
    }

    pub fn check(&self, now: DateTime<Utc>, deadline: DateTime<Utc>) -> Result<(), Rejection> {
        if self.admits(now, deadline) {
            Ok(())
        } else {
            Err(Rejection::invalid_transition(self.reason()))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAssignment {
    pub title: String,
    pub context: Option<String>,
    pub attachment: Option<AttachmentName>,
    pub deadline: DateTime<Utc>,
    pub lesson_id: LessonId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentChanges {
    pub title: Option<String>,
    pub context: Option<String>,
    pub attachment: Option<AttachmentName>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: Option<String>,
    pub file: Option<AttachmentName>,
}

/// Context and attachment of a solution, as submitted or after an edit.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionBody {
    pub context: Option<String>,
    pub attachment: Option<AttachmentName>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn attachment(value: Option<String>) -> Result<Option<AttachmentName>, Rejection> {
    non_blank(value)
        .map(AttachmentName::new)
        .transpose()
        .map_err(Rejection::from)
}

pub fn create_assignment(
    class: &Class,
    dto: CreateAssignmentDto,
    now: DateTime<Utc>,
) -> Result<NewAssignment, Rejection> {
    if !class.has_lesson(dto.lesson_id) {
        return Err(Rejection::invalid_transition(
            "This lesson does not belong to this class.",
        ));
    }
    if dto.deadline <= now {
        return Err(Rejection::validation(
            "The deadline must be later than creation time.",
        ));
    }

    Ok(NewAssignment {
        title: dto.title,
        context: non_blank(dto.context),
        attachment: attachment(dto.attachment)?,
        deadline: dto.deadline,
        lesson_id: dto.lesson_id,
    })
}

/// Edits allowed while the assignment is [`AssignmentState::Open`]. A moved
/// deadline must still be later than the assignment's creation.
pub fn update_assignment(
    assignment: &Assignment,
    dto: UpdateAssignmentDto,
    now: DateTime<Utc>,
) -> Result<AssignmentChanges, Rejection> {
    DeadlineWindow::Before.check(now, assignment.deadline)?;

    if let Some(deadline) = dto.deadline {
        if deadline <= assignment.created_at {
            return Err(Rejection::validation(
                "The deadline must be later than creation time.",
            ));
        }
    }

    Ok(AssignmentChanges {
        title: dto.title,
        context: dto.context,
        attachment: attachment(dto.attachment)?,
        deadline: dto.deadline,
    })
}

pub fn add_answer(
    assignment: &Assignment,
    dto: AddAnswerDto,
    now: DateTime<Utc>,
) -> Result<Answer, Rejection> {
    DeadlineWindow::AtOrAfter.check(now, assignment.deadline)?;

    let text = non_blank(dto.answer_text);
    let file = attachment(dto.answer_file)?;
    if text.is_none() && file.is_none() {
        return Err(Rejection::validation(
            "You must type answer or upload answer's file.",
        ));
    }

    Ok(Answer { text, file })
}

pub fn submit_solution(
    assignment: &Assignment,
    dto: SubmitSolutionDto,
    now: DateTime<Utc>,
) -> Result<SolutionBody, Rejection> {
    DeadlineWindow::Before.check(now, assignment.deadline)?;

    let body = SolutionBody {
        context: non_blank(dto.context),
        attachment: attachment(dto.attachment)?,
    };
    require_content(&body)?;
    Ok(body)
}

/// Merges the edit into the current solution. Student and assignment are
/// not part of the payload and never change.
pub fn update_solution(
    solution: &Solution,
    assignment: &Assignment,
    dto: UpdateSolutionDto,
    now: DateTime<Utc>,
) -> Result<SolutionBody, Rejection> {
    DeadlineWindow::Before.check(now, assignment.deadline)?;

    let body = SolutionBody {
        context: match dto.context {
            Some(context) => non_blank(Some(context)),
            None => solution.context.clone(),
        },
        attachment: match dto.attachment {
            Some(file) => attachment(Some(file))?,
            None => solution.attachment.clone(),
        },
    };
    require_content(&body)?;
    Ok(body)
}

fn require_content(body: &SolutionBody) -> Result<(), Rejection> {
    if body.context.is_none() && body.attachment.is_none() {
        return Err(Rejection::validation(
            "You must type your solution or upload its file.",
        ));
    }
    Ok(())
}

/// Grading is closed until the deadline has strictly passed; the window is
/// checked before the value so an early attempt is always an invalid
/// transition. Regrading a graded solution is allowed.
pub fn grade_solution(
    assignment: &Assignment,
    dto: GradeSolutionDto,
    now: DateTime<Utc>,
) -> Result<Grade, Rejection> {
    DeadlineWindow::After.check(now, assignment.deadline)?;

    let value = dto
        .grade
        .ok_or_else(|| Rejection::validation("The grade must be provided."))?;
    Ok(Grade::new(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use chrono::Duration;

    fn grade(value: f64) -> GradeSolutionDto {
        GradeSolutionDto { grade: Some(value) }
    }

    #[test]
    fn test_deadline_windows_at_the_boundary() {
        let t = deadline();
        assert!(DeadlineWindow::Before.admits(before_deadline(), t));
        assert!(!DeadlineWindow::Before.admits(t, t));
        assert!(DeadlineWindow::AtOrAfter.admits(t, t));
        assert!(!DeadlineWindow::AtOrAfter.admits(before_deadline(), t));
        assert!(!DeadlineWindow::After.admits(t, t));
        assert!(DeadlineWindow::After.admits(after_deadline(), t));
    }

    #[test]
    fn test_assignment_states() {
        let mut world = World::new();
        assert_eq!(
            AssignmentState::of(&world.assignment, before_deadline()),
            AssignmentState::Open
        );
        assert_eq!(
            AssignmentState::of(&world.assignment, deadline()),
            AssignmentState::AwaitingAnswer
        );
        world.assignment.answer_text = Some("x = 3".into());
        assert_eq!(
            AssignmentState::of(&world.assignment, after_deadline()),
            AssignmentState::Answered
        );
    }

    #[test]
    fn test_create_assignment_requires_offered_lesson() {
        let world = World::new();
        let dto = CreateAssignmentDto {
            class_id: world.class.id,
            lesson_id: LessonId::new(),
            title: "Essay".into(),
            context: None,
            deadline: after_deadline(),
            attachment: None,
        };
        let err = create_assignment(&world.class, dto, before_deadline()).unwrap_err();
        assert_eq!(
            err,
            Rejection::invalid_transition("This lesson does not belong to this class.")
        );
    }

    #[test]
    fn test_create_assignment_deadline_must_be_in_the_future() {
        let world = World::new();
        let dto = CreateAssignmentDto {
            class_id: world.class.id,
            lesson_id: world.lesson.id,
            title: "Essay".into(),
            context: Some("  ".into()),
            deadline: deadline(),
            attachment: Some("brief.pdf".into()),
        };
        let err = create_assignment(&world.class, dto.clone(), deadline()).unwrap_err();
        assert!(matches!(err, Rejection::Validation(_)));

        let created = create_assignment(&world.class, dto, before_deadline()).unwrap();
        assert_eq!(created.context, None);
        assert_eq!(created.attachment.unwrap().as_str(), "brief.pdf");
    }

    #[test]
    fn test_update_assignment_closed_after_deadline() {
        let world = World::new();
        let err = update_assignment(&world.assignment, UpdateAssignmentDto::default(), deadline())
            .unwrap_err();
        assert!(matches!(err, Rejection::InvalidTransition(_)));
    }

    #[test]
    fn test_update_assignment_deadline_after_creation() {
        let world = World::new();
        let dto = UpdateAssignmentDto {
            deadline: Some(world.assignment.created_at - Duration::hours(1)),
            ..Default::default()
        };
        let err = update_assignment(&world.assignment, dto, before_deadline()).unwrap_err();
        assert_eq!(
            err,
            Rejection::validation("The deadline must be later than creation time.")
        );
    }

    #[test]
    fn test_add_answer_window_and_content() {
        let world = World::new();
        let text = AddAnswerDto {
            answer_text: Some("x = 3".into()),
            answer_file: None,
        };

        let err = add_answer(&world.assignment, text.clone(), before_deadline()).unwrap_err();
        assert!(matches!(err, Rejection::InvalidTransition(_)));

        let answer = add_answer(&world.assignment, text, deadline()).unwrap();
        assert_eq!(answer.text.as_deref(), Some("x = 3"));

        let err = add_answer(&world.assignment, AddAnswerDto::default(), deadline()).unwrap_err();
        assert_eq!(
            err,
            Rejection::validation("You must type answer or upload answer's file.")
        );

        let bad_file = AddAnswerDto {
            answer_text: None,
            answer_file: Some("answer.png".into()),
        };
        let err = add_answer(&world.assignment, bad_file, deadline()).unwrap_err();
        assert_eq!(err, Rejection::validation("You should upload PDF or ZIP file."));
    }

    #[test]
    fn test_submission_rejected_at_and_after_deadline() {
        let world = World::new();
        let dto = SubmitSolutionDto {
            context: Some("x = 3".into()),
            attachment: None,
        };
        assert!(submit_solution(&world.assignment, dto.clone(), before_deadline()).is_ok());

        for now in [deadline(), after_deadline()] {
            let err = submit_solution(&world.assignment, dto.clone(), now).unwrap_err();
            assert_eq!(
                err,
                Rejection::invalid_transition("The assignment deadline has passed.")
            );
        }
    }

    #[test]
    fn test_submission_needs_content() {
        let world = World::new();
        let err = submit_solution(&world.assignment, SubmitSolutionDto::default(), before_deadline())
            .unwrap_err();
        assert!(matches!(err, Rejection::Validation(_)));
    }

    #[test]
    fn test_update_solution_keeps_untouched_fields() {
        let world = World::new();
        let dto = UpdateSolutionDto {
            context: None,
            attachment: Some("work.zip".into()),
        };
        let body =
            update_solution(&world.solution, &world.assignment, dto, before_deadline()).unwrap();
        assert_eq!(body.context.as_deref(), Some("x = 3"));
        assert_eq!(body.attachment.unwrap().as_str(), "work.zip");

        let clear = UpdateSolutionDto {
            context: Some(String::new()),
            attachment: None,
        };
        let err = update_solution(&world.solution, &world.assignment, clear, before_deadline())
            .unwrap_err();
        assert!(matches!(err, Rejection::Validation(_)));
    }

    #[test]
    fn test_grading_scenario() {
        let world = World::new();

        let err = grade_solution(&world.assignment, grade(80.0), before_deadline()).unwrap_err();
        assert!(matches!(err, Rejection::InvalidTransition(_)));

        let err = grade_solution(&world.assignment, grade(80.0), deadline()).unwrap_err();
        assert!(matches!(err, Rejection::InvalidTransition(_)));

        let err = grade_solution(&world.assignment, grade(105.0), after_deadline()).unwrap_err();
        assert_eq!(
            err,
            Rejection::validation("The grade must not be greater than 100.")
        );

        let err = grade_solution(&world.assignment, GradeSolutionDto::default(), after_deadline())
            .unwrap_err();
        assert_eq!(err, Rejection::validation("The grade must be provided."));

        let graded = grade_solution(&world.assignment, grade(80.0), after_deadline()).unwrap();
        assert_eq!(graded.value(), 80.0);

        let mut solution = world.solution.clone();
        assert_eq!(SolutionState::of(&solution), SolutionState::Submitted);
        solution.grade = Some(graded);
        assert_eq!(SolutionState::of(&solution), SolutionState::Graded);
    }
}
