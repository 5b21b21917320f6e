use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    add_lesson, add_student, create_class, delete_class, get_class, list_class_lessons,
    list_class_students, list_classes, remove_student, update_class,
};

pub fn init_classes_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classes).post(create_class))
        .route(
            "/{id}",
            get(get_class).patch(update_class).delete(delete_class),
        )
        .route("/{id}/add-student", post(add_student))
        .route("/{id}/remove-student", post(remove_student))
        .route("/{id}/students", get(list_class_students))
        .route("/{id}/add-lesson", post(add_lesson))
        .route("/{id}/lessons", get(list_class_lessons))
}
