use tracing::{info, instrument};

use classbook_authz::{
    Action, Chain, DeadlineWindow, Mutation, Precondition, Scan, Store, workflow,
};
use classbook_core::AppError;
use classbook_models::{
    AddAnswerDto, Assignment, AssignmentId, CreateAssignmentDto, Solution, SolutionId,
    SubmitSolutionDto, UpdateAssignmentDto,
};

use crate::middleware::session::Session;

pub struct AssignmentService;

impl AssignmentService {
    /// Assignments of the classes the actor teaches or attends.
    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn list_assignments(
        store: &dyn Store,
        session: &Session,
    ) -> Result<Vec<Assignment>, AppError> {
        let chains = store
            .scan(Scan::AssignmentsInClasses(session.actor.class_ids()))
            .await?;

        Ok(session
            .visible(chains)
            .into_iter()
            .filter_map(|chain| match chain {
                Chain::Assignment { assignment, .. } => Some(assignment),
                _ => None,
            })
            .collect())
    }

    #[instrument(skip(store, session, dto), fields(actor = %session.user_id(), class_id = %dto.class_id))]
    pub async fn create_assignment(
        store: &dyn Store,
        session: &Session,
        dto: CreateAssignmentDto,
    ) -> Result<Assignment, AppError> {
        let class = session
            .class(store, dto.class_id, Action::CreateAssignment)
            .await?;
        let new = workflow::create_assignment(&class, dto, session.now)?;

        let assignment = Assignment {
            id: AssignmentId::new(),
            title: new.title,
            context: new.context,
            attachment: new.attachment,
            grade_max: workflow::GRADE_MAX,
            deadline: new.deadline,
            answer_text: None,
            answer_file: None,
            lesson_id: new.lesson_id,
            class_id: class.id,
            created_at: session.now,
            last_modified: session.now,
        };

        let plan = session
            .plan(Mutation::CreateAssignment(assignment))
            .require(Precondition::ClassTeacher {
                class_id: class.id,
                user_id: session.user_id(),
            })
            .require(Precondition::LessonOffered {
                class_id: class.id,
                lesson_id: new.lesson_id,
            });
        let assignment = store.commit(plan).await?.into_assignment()?;

        info!(assignment_id = %assignment.id, "Assignment created");
        Ok(assignment)
    }

    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn get_assignment(
        store: &dyn Store,
        session: &Session,
        assignment_id: AssignmentId,
    ) -> Result<Assignment, AppError> {
        let (assignment, _) = session
            .assignment(store, assignment_id, Action::View)
            .await?;
        Ok(assignment)
    }

    /// Edits an assignment whose deadline has not yet passed.
    #[instrument(skip(store, session, dto), fields(actor = %session.user_id()))]
    pub async fn update_assignment(
        store: &dyn Store,
        session: &Session,
        assignment_id: AssignmentId,
        dto: UpdateAssignmentDto,
    ) -> Result<Assignment, AppError> {
        let (assignment, class) = session
            .assignment(store, assignment_id, Action::Update)
            .await?;
        let changes = workflow::update_assignment(&assignment, dto, session.now)?;

        let plan = session
            .plan(Mutation::UpdateAssignment {
                assignment_id,
                changes,
            })
            .require(Precondition::ClassTeacher {
                class_id: class.id,
                user_id: session.user_id(),
            })
            .require(Precondition::Deadline {
                assignment_id,
                window: DeadlineWindow::Before,
            });
        store.commit(plan).await?.into_assignment()
    }

    /// Publishes the model answer once the deadline has been reached.
    #[instrument(skip(store, session, dto), fields(actor = %session.user_id()))]
    pub async fn add_answer(
        store: &dyn Store,
        session: &Session,
        assignment_id: AssignmentId,
        dto: AddAnswerDto,
    ) -> Result<Assignment, AppError> {
        let (assignment, class) = session
            .assignment(store, assignment_id, Action::AddAnswer)
            .await?;
        let answer = workflow::add_answer(&assignment, dto, session.now)?;

        let plan = session
            .plan(Mutation::AddAnswer {
                assignment_id,
                answer,
            })
            .require(Precondition::ClassTeacher {
                class_id: class.id,
                user_id: session.user_id(),
            })
            .require(Precondition::Deadline {
                assignment_id,
                window: DeadlineWindow::AtOrAfter,
            });
        let assignment = store.commit(plan).await?.into_assignment()?;

        info!(%assignment_id, "Answer published");
        Ok(assignment)
    }

    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn list_solutions(
        store: &dyn Store,
        session: &Session,
        assignment_id: AssignmentId,
    ) -> Result<Vec<Solution>, AppError> {
        session
            .assignment(store, assignment_id, Action::ListSolutions)
            .await?;

        let chains = store
            .scan(Scan::SolutionsOfAssignment(assignment_id))
            .await?;
        Ok(session
            .visible(chains)
            .into_iter()
            .filter_map(|chain| match chain {
                Chain::Solution { solution, .. } => Some(solution),
                _ => None,
            })
            .collect())
    }

    /// Submits a solution as the acting student. With `allow_multiple` off a
    /// student holds at most one solution per assignment.
    #[instrument(skip(store, session, dto), fields(actor = %session.user_id()))]
    pub async fn submit_solution(
        store: &dyn Store,
        session: &Session,
        assignment_id: AssignmentId,
        dto: SubmitSolutionDto,
        allow_multiple: bool,
    ) -> Result<Solution, AppError> {
        let (assignment, class) = session
            .assignment(store, assignment_id, Action::SubmitSolution)
            .await?;
        let body = workflow::submit_solution(&assignment, dto, session.now)?;

        let solution = Solution {
            id: SolutionId::new(),
            context: body.context,
            attachment: body.attachment,
            grade: None,
            graded_at: None,
            student_id: session.user_id(),
            assignment_id,
            created_at: session.now,
            last_modified: session.now,
        };

        let mut plan = session
            .plan(Mutation::SubmitSolution(solution))
            .require(Precondition::ClassStudent {
                class_id: class.id,
                user_id: session.user_id(),
            })
            .require(Precondition::Deadline {
                assignment_id,
                window: DeadlineWindow::Before,
            });
        if !allow_multiple {
            plan = plan.require(Precondition::SingleSubmission {
                assignment_id,
                student_id: session.user_id(),
            });
        }
        let solution = store.commit(plan).await?.into_solution()?;

        info!(solution_id = %solution.id, %assignment_id, "Solution submitted");
        Ok(solution)
    }
}
