use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{create_news, delete_news, get_news, list_news, update_news};

pub fn init_news_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_news).post(create_news))
        .route(
            "/{id}",
            get(get_news).patch(update_news).delete(delete_news),
        )
}
