use axum::{Json, extract::State};

use classbook_core::AppError;
use classbook_models::{Lesson, UpdateProfileDto, User};

use crate::middleware::session::Session;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::UserService;

#[utoipa::path(
    get,
    path = "/api/users/my-lessons",
    responses(
        (status = 200, description = "Lessons of the classes the caller teaches or attends", body = Vec<Lesson>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - teachers and students only")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn list_my_lessons(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Lesson>>, AppError> {
    let lessons = UserService::my_lessons(state.store.as_ref(), &session).await?;
    Ok(Json(lessons))
}

#[utoipa::path(
    patch,
    path = "/api/users/me",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Account inactive"),
        (status = 422, description = "Validation error")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update_profile(state.store.as_ref(), &session, dto).await?;
    Ok(Json(user))
}
