use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use super::controller::{list_my_lessons, update_profile};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/my-lessons", get(list_my_lessons))
        .route("/me", patch(update_profile))
}
