use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    add_answer, create_assignment, get_assignment, list_assignment_solutions, list_assignments,
    submit_solution, update_assignment,
};

pub fn init_assignments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assignments).post(create_assignment))
        .route("/{id}", get(get_assignment).patch(update_assignment))
        .route("/{id}/add-answer", post(add_answer))
        .route(
            "/{id}/solutions",
            get(list_assignment_solutions).post(submit_solution),
        )
}
