use tracing::{info, instrument};

use classbook_authz::{
    Action, Chain, DeadlineWindow, Mutation, Precondition, Scan, Store, workflow,
};
use classbook_core::AppError;
use classbook_models::{GradeSolutionDto, Solution, SolutionId, UpdateSolutionDto};

use crate::middleware::session::Session;

pub struct SolutionService;

impl SolutionService {
    /// A teacher sees the solutions of the classes they teach, a student
    /// only their own.
    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn list_solutions(
        store: &dyn Store,
        session: &Session,
    ) -> Result<Vec<Solution>, AppError> {
        let chains = store
            .scan(Scan::SolutionsInClasses(session.actor.class_ids()))
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

    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn get_solution(
        store: &dyn Store,
        session: &Session,
        solution_id: SolutionId,
    ) -> Result<Solution, AppError> {
        let (solution, _, _) = session.solution(store, solution_id, Action::View).await?;
        Ok(solution)
    }

    #[instrument(skip(store, session, dto), fields(actor = %session.user_id()))]
    pub async fn update_solution(
        store: &dyn Store,
        session: &Session,
        solution_id: SolutionId,
        dto: UpdateSolutionDto,
    ) -> Result<Solution, AppError> {
        let (solution, assignment, _) = session
            .solution(store, solution_id, Action::Update)
            .await?;
        let body = workflow::update_solution(&solution, &assignment, dto, session.now)?;

        let plan = session
            .plan(Mutation::UpdateSolution { solution_id, body })
            .require(Precondition::SolutionAuthor {
                solution_id,
                student_id: session.user_id(),
            })
            .require(Precondition::Deadline {
                assignment_id: assignment.id,
                window: DeadlineWindow::Before,
            });
        store.commit(plan).await?.into_solution()
    }

    /// Grades or regrades a solution once the deadline has passed.
    #[instrument(skip(store, session, dto), fields(actor = %session.user_id()))]
    pub async fn grade_solution(
        store: &dyn Store,
        session: &Session,
        solution_id: SolutionId,
        dto: GradeSolutionDto,
    ) -> Result<Solution, AppError> {
        let (_, assignment, class) = session
            .solution(store, solution_id, Action::GradeSolution)
            .await?;
        let grade = workflow::grade_solution(&assignment, dto, session.now)?;

        let plan = session
            .plan(Mutation::GradeSolution { solution_id, grade })
            .require(Precondition::ClassTeacher {
                class_id: class.id,
                user_id: session.user_id(),
            })
            .require(Precondition::Deadline {
                assignment_id: assignment.id,
                window: DeadlineWindow::After,
            });
        let solution = store.commit(plan).await?.into_solution()?;

        info!(%solution_id, grade = %grade, "Solution graded");
        Ok(solution)
    }
}
