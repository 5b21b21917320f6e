use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{get_solution, grade_solution, list_solutions, update_solution};

pub fn init_solutions_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_solutions))
        .route("/{id}", get(get_solution).patch(update_solution))
        .route("/{id}/grade", post(grade_solution))
}
