use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use classbook_core::AppError;
use classbook_models::{
    AddLessonDto, Class, ClassId, CreateClassDto, Lesson, MessageResponse, StudentMembershipDto,
    UpdateClassDto, User,
};

use crate::middleware::session::Session;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::ClassService;

#[utoipa::path(
    get,
    path = "/api/classes",
    responses(
        (status = 200, description = "Classes the caller teaches, attends or manages", body = Vec<Class>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn list_classes(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Class>>, AppError> {
    let classes = ClassService::list_classes(state.store.as_ref(), &session).await?;
    Ok(Json(classes))
}

#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = CreateClassDto,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - school manager only"),
        (status = 404, description = "School not found"),
        (status = 422, description = "Validation error")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn create_class(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(dto): ValidatedJson<CreateClassDto>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let class = ClassService::create_class(state.store.as_ref(), &session, dto).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}",
    params(
        ("id" = String, Path, description = "Class ID")
    ),
    responses(
        (status = 200, description = "Class details", body = Class),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Class not found")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn get_class(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ClassId>,
) -> Result<Json<Class>, AppError> {
    let class = ClassService::get_class(state.store.as_ref(), &session, id).await?;
    Ok(Json(class))
}

#[utoipa::path(
    patch,
    path = "/api/classes/{id}",
    params(
        ("id" = String, Path, description = "Class ID")
    ),
    request_body = UpdateClassDto,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - school manager only"),
        (status = 404, description = "Class not found"),
        (status = 422, description = "Validation error")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn update_class(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ClassId>,
    ValidatedJson(dto): ValidatedJson<UpdateClassDto>,
) -> Result<Json<Class>, AppError> {
    let class = ClassService::update_class(state.store.as_ref(), &session, id, dto).await?;
    Ok(Json(class))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{id}",
    params(
        ("id" = String, Path, description = "Class ID")
    ),
    responses(
        (status = 204, description = "Class deleted with its assignments and news"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - school manager only"),
        (status = 404, description = "Class not found")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn delete_class(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ClassId>,
) -> Result<StatusCode, AppError> {
    ClassService::delete_class(state.store.as_ref(), &session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/classes/{id}/add-student",
    params(
        ("id" = String, Path, description = "Class ID")
    ),
    request_body = StudentMembershipDto,
    responses(
        (status = 200, description = "Student added", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - class teacher only"),
        (status = 404, description = "Class or student not found"),
        (status = 409, description = "Student already in class"),
        (status = 422, description = "Missing or malformed national id")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn add_student(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ClassId>,
    Json(dto): Json<StudentMembershipDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let response = ClassService::add_student(state.store.as_ref(), &session, id, dto).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/classes/{id}/remove-student",
    params(
        ("id" = String, Path, description = "Class ID")
    ),
    request_body = StudentMembershipDto,
    responses(
        (status = 200, description = "Student removed", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - class teacher only"),
        (status = 404, description = "Class or student not found"),
        (status = 409, description = "Student not in class"),
        (status = 422, description = "Missing or malformed national id")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn remove_student(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ClassId>,
    Json(dto): Json<StudentMembershipDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let response = ClassService::remove_student(state.store.as_ref(), &session, id, dto).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}/students",
    params(
        ("id" = String, Path, description = "Class ID")
    ),
    responses(
        (status = 200, description = "Students of the class", body = Vec<User>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - class teacher only"),
        (status = 404, description = "Class not found")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn list_class_students(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ClassId>,
) -> Result<Json<Vec<User>>, AppError> {
    let students = ClassService::list_students(state.store.as_ref(), &session, id).await?;
    Ok(Json(students))
}

#[utoipa::path(
    post,
    path = "/api/classes/{id}/add-lesson",
    params(
        ("id" = String, Path, description = "Class ID")
    ),
    request_body = AddLessonDto,
    responses(
        (status = 201, description = "Lesson offered by the class", body = Lesson),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - school manager only"),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Lesson already offered"),
        (status = 422, description = "Missing or overlong lesson name")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn add_lesson(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ClassId>,
    Json(dto): Json<AddLessonDto>,
) -> Result<(StatusCode, Json<Lesson>), AppError> {
    let lesson = ClassService::add_lesson(state.store.as_ref(), &session, id, dto).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}/lessons",
    params(
        ("id" = String, Path, description = "Class ID")
    ),
    responses(
        (status = 200, description = "Lessons offered by the class", body = Vec<Lesson>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Class not found")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
pub async fn list_class_lessons(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ClassId>,
) -> Result<Json<Vec<Lesson>>, AppError> {
    let lessons = ClassService::list_lessons(state.store.as_ref(), &session, id).await?;
    Ok(Json(lessons))
}
