use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use classbook_core::AppError;
use classbook_models::{CreateNewsDto, News, NewsId, UpdateNewsDto};

use crate::middleware::session::Session;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::NewsService;

#[utoipa::path(
    get,
    path = "/api/news",
    responses(
        (status = 200, description = "News visible to the caller", body = Vec<News>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "News",
    security(("bearer_auth" = []))
)]
pub async fn list_news(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<News>>, AppError> {
    let news = NewsService::list_news(state.store.as_ref(), &session).await?;
    Ok(Json(news))
}

#[utoipa::path(
    post,
    path = "/api/news",
    request_body = CreateNewsDto,
    responses(
        (status = 201, description = "News created", body = News),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - class teacher or school manager only"),
        (status = 404, description = "Class or school not found"),
        (status = 422, description = "Validation error")
    ),
    tag = "News",
    security(("bearer_auth" = []))
)]
pub async fn create_news(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(dto): ValidatedJson<CreateNewsDto>,
) -> Result<(StatusCode, Json<News>), AppError> {
    let news = NewsService::create_news(state.store.as_ref(), &session, dto).await?;
    Ok((StatusCode::CREATED, Json(news)))
}

#[utoipa::path(
    get,
    path = "/api/news/{id}",
    params(
        ("id" = String, Path, description = "News ID")
    ),
    responses(
        (status = 200, description = "News details", body = News),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "News not found")
    ),
    tag = "News",
    security(("bearer_auth" = []))
)]
pub async fn get_news(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<NewsId>,
) -> Result<Json<News>, AppError> {
    let news = NewsService::get_news(state.store.as_ref(), &session, id).await?;
    Ok(Json(news))
}

#[utoipa::path(
    patch,
    path = "/api/news/{id}",
    params(
        ("id" = String, Path, description = "News ID")
    ),
    request_body = UpdateNewsDto,
    responses(
        (status = 200, description = "News updated", body = News),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - creator or school manager only"),
        (status = 404, description = "News not found"),
        (status = 422, description = "Validation error")
    ),
    tag = "News",
    security(("bearer_auth" = []))
)]
pub async fn update_news(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<NewsId>,
    ValidatedJson(dto): ValidatedJson<UpdateNewsDto>,
) -> Result<Json<News>, AppError> {
    let news = NewsService::update_news(state.store.as_ref(), &session, id, dto).await?;
    Ok(Json(news))
}

#[utoipa::path(
    delete,
    path = "/api/news/{id}",
    params(
        ("id" = String, Path, description = "News ID")
    ),
    responses(
        (status = 204, description = "News deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - creator or school manager only"),
        (status = 404, description = "News not found")
    ),
    tag = "News",
    security(("bearer_auth" = []))
)]
pub async fn delete_news(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<NewsId>,
) -> Result<StatusCode, AppError> {
    NewsService::delete_news(state.store.as_ref(), &session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
