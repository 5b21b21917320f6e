use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use classbook_core::AppError;
use classbook_models::{
    AddAnswerDto, AssignmentId, AssignmentResponse, CreateAssignmentDto, SolutionResponse,
    SubmitSolutionDto, UpdateAssignmentDto,
};

use crate::middleware::session::Session;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::AssignmentService;

#[utoipa::path(
    get,
    path = "/api/assignments",
    responses(
        (status = 200, description = "Assignments of the caller's classes", body = Vec<AssignmentResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
pub async fn list_assignments(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<AssignmentResponse>>, AppError> {
    let assignments = AssignmentService::list_assignments(state.store.as_ref(), &session).await?;
    Ok(Json(
        assignments
            .into_iter()
            .map(|assignment| AssignmentResponse::new(assignment, session.now))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/assignments",
    request_body = CreateAssignmentDto,
    responses(
        (status = 201, description = "Assignment created", body = AssignmentResponse),
        (status = 400, description = "Lesson not offered by the class"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - class teacher only"),
        (status = 404, description = "Class not found"),
        (status = 422, description = "Validation error")
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
pub async fn create_assignment(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(dto): ValidatedJson<CreateAssignmentDto>,
) -> Result<(StatusCode, Json<AssignmentResponse>), AppError> {
    let assignment =
        AssignmentService::create_assignment(state.store.as_ref(), &session, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(AssignmentResponse::new(assignment, session.now)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/assignments/{id}",
    params(
        ("id" = String, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "Assignment details", body = AssignmentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Assignment not found")
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
pub async fn get_assignment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AssignmentId>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let assignment = AssignmentService::get_assignment(state.store.as_ref(), &session, id).await?;
    Ok(Json(AssignmentResponse::new(assignment, session.now)))
}

#[utoipa::path(
    patch,
    path = "/api/assignments/{id}",
    params(
        ("id" = String, Path, description = "Assignment ID")
    ),
    request_body = UpdateAssignmentDto,
    responses(
        (status = 200, description = "Assignment updated", body = AssignmentResponse),
        (status = 400, description = "Deadline has passed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - class teacher only"),
        (status = 404, description = "Assignment not found"),
        (status = 422, description = "Validation error")
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
pub async fn update_assignment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AssignmentId>,
    ValidatedJson(dto): ValidatedJson<UpdateAssignmentDto>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let assignment =
        AssignmentService::update_assignment(state.store.as_ref(), &session, id, dto).await?;
    Ok(Json(AssignmentResponse::new(assignment, session.now)))
}

#[utoipa::path(
    post,
    path = "/api/assignments/{id}/add-answer",
    params(
        ("id" = String, Path, description = "Assignment ID")
    ),
    request_body = AddAnswerDto,
    responses(
        (status = 200, description = "Answer published", body = AssignmentResponse),
        (status = 400, description = "Deadline not reached yet"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - class teacher only"),
        (status = 404, description = "Assignment not found"),
        (status = 422, description = "Neither answer text nor file given")
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
pub async fn add_answer(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AssignmentId>,
    Json(dto): Json<AddAnswerDto>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let assignment = AssignmentService::add_answer(state.store.as_ref(), &session, id, dto).await?;
    Ok(Json(AssignmentResponse::new(assignment, session.now)))
}

#[utoipa::path(
    get,
    path = "/api/assignments/{id}/solutions",
    params(
        ("id" = String, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "Solutions submitted for the assignment", body = Vec<SolutionResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - class teacher only"),
        (status = 404, description = "Assignment not found")
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
pub async fn list_assignment_solutions(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AssignmentId>,
) -> Result<Json<Vec<SolutionResponse>>, AppError> {
    let solutions = AssignmentService::list_solutions(state.store.as_ref(), &session, id).await?;
    Ok(Json(solutions.into_iter().map(SolutionResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/assignments/{id}/solutions",
    params(
        ("id" = String, Path, description = "Assignment ID")
    ),
    request_body = SubmitSolutionDto,
    responses(
        (status = 201, description = "Solution submitted", body = SolutionResponse),
        (status = 400, description = "Deadline has passed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - students of the class only"),
        (status = 404, description = "Assignment not found"),
        (status = 409, description = "Solution already submitted"),
        (status = 422, description = "Neither context nor attachment given")
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
pub async fn submit_solution(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AssignmentId>,
    Json(dto): Json<SubmitSolutionDto>,
) -> Result<(StatusCode, Json<SolutionResponse>), AppError> {
    let solution = AssignmentService::submit_solution(
        state.store.as_ref(),
        &session,
        id,
        dto,
        state.workflow_config.allow_multiple_submissions,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(solution.into())))
}
