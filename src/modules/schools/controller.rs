use axum::{
    Json,
    extract::{Path, State},
};

use classbook_core::AppError;
use classbook_models::{Lesson, School, SchoolId, User};

use crate::middleware::session::Session;
use crate::state::AppState;

use super::service::SchoolService;

#[utoipa::path(
    get,
    path = "/api/schools",
    responses(
        (status = 200, description = "Schools the caller manages", body = Vec<School>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn list_schools(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<School>>, AppError> {
    let schools = SchoolService::list_schools(state.store.as_ref(), &session).await?;
    Ok(Json(schools))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}",
    params(
        ("id" = String, Path, description = "School ID")
    ),
    responses(
        (status = 200, description = "School details", body = School),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "School not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn get_school(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<SchoolId>,
) -> Result<Json<School>, AppError> {
    let school = SchoolService::get_school(state.store.as_ref(), &session, id).await?;
    Ok(Json(school))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}/students",
    params(
        ("id" = String, Path, description = "School ID")
    ),
    responses(
        (status = 200, description = "Students of every class in the school", body = Vec<User>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - school manager only"),
        (status = 404, description = "School not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn list_school_students(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<SchoolId>,
) -> Result<Json<Vec<User>>, AppError> {
    let students = SchoolService::list_students(state.store.as_ref(), &session, id).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}/teachers",
    params(
        ("id" = String, Path, description = "School ID")
    ),
    responses(
        (status = 200, description = "Teachers of classes in the school", body = Vec<User>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - school manager only"),
        (status = 404, description = "School not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn list_school_teachers(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<SchoolId>,
) -> Result<Json<Vec<User>>, AppError> {
    let teachers = SchoolService::list_teachers(state.store.as_ref(), &session, id).await?;
    Ok(Json(teachers))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}/lessons",
    params(
        ("id" = String, Path, description = "School ID")
    ),
    responses(
        (status = 200, description = "Lessons offered by classes in the school", body = Vec<Lesson>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - school manager only"),
        (status = 404, description = "School not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
pub async fn list_school_lessons(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<SchoolId>,
) -> Result<Json<Vec<Lesson>>, AppError> {
    let lessons = SchoolService::list_lessons(state.store.as_ref(), &session, id).await?;
    Ok(Json(lessons))
}
