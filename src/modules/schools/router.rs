use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    get_school, list_school_lessons, list_school_students, list_school_teachers, list_schools,
};

pub fn init_schools_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_schools))
        .route("/{id}", get(get_school))
        .route("/{id}/students", get(list_school_students))
        .route("/{id}/teachers", get(list_school_teachers))
        .route("/{id}/lessons", get(list_school_lessons))
}
