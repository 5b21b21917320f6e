use axum::{
    Json,
    extract::{Path, State},
};

use classbook_core::AppError;
use classbook_models::{GradeSolutionDto, SolutionId, SolutionResponse, UpdateSolutionDto};

use crate::middleware::session::Session;
use crate::state::AppState;

use super::service::SolutionService;

#[utoipa::path(
    get,
    path = "/api/solutions",
    responses(
        (status = 200, description = "Solutions the caller authored or teaches", body = Vec<SolutionResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Solutions",
    security(("bearer_auth" = []))
)]
pub async fn list_solutions(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<SolutionResponse>>, AppError> {
    let solutions = SolutionService::list_solutions(state.store.as_ref(), &session).await?;
    Ok(Json(solutions.into_iter().map(SolutionResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/solutions/{id}",
    params(
        ("id" = String, Path, description = "Solution ID")
    ),
    responses(
        (status = 200, description = "Solution details", body = SolutionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Solution not found")
    ),
    tag = "Solutions",
    security(("bearer_auth" = []))
)]
pub async fn get_solution(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<SolutionId>,
) -> Result<Json<SolutionResponse>, AppError> {
    let solution = SolutionService::get_solution(state.store.as_ref(), &session, id).await?;
    Ok(Json(solution.into()))
}

#[utoipa::path(
    patch,
    path = "/api/solutions/{id}",
    params(
        ("id" = String, Path, description = "Solution ID")
    ),
    request_body = UpdateSolutionDto,
    responses(
        (status = 200, description = "Solution updated", body = SolutionResponse),
        (status = 400, description = "Deadline has passed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - author only"),
        (status = 404, description = "Solution not found"),
        (status = 422, description = "Solution left empty")
    ),
    tag = "Solutions",
    security(("bearer_auth" = []))
)]
pub async fn update_solution(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<SolutionId>,
    Json(dto): Json<UpdateSolutionDto>,
) -> Result<Json<SolutionResponse>, AppError> {
    let solution =
        SolutionService::update_solution(state.store.as_ref(), &session, id, dto).await?;
    Ok(Json(solution.into()))
}

#[utoipa::path(
    post,
    path = "/api/solutions/{id}/grade",
    params(
        ("id" = String, Path, description = "Solution ID")
    ),
    request_body = GradeSolutionDto,
    responses(
        (status = 200, description = "Solution graded", body = SolutionResponse),
        (status = 400, description = "Deadline not passed yet"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - class teacher only"),
        (status = 404, description = "Solution not found"),
        (status = 422, description = "Grade missing or out of range")
    ),
    tag = "Solutions",
    security(("bearer_auth" = []))
)]
pub async fn grade_solution(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<SolutionId>,
    Json(dto): Json<GradeSolutionDto>,
) -> Result<Json<SolutionResponse>, AppError> {
    let solution = SolutionService::grade_solution(state.store.as_ref(), &session, id, dto).await?;
    Ok(Json(solution.into()))
}
