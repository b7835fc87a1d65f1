use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{create_answer, delete_answer, get_answer, search_answers, update_answer};
use crate::state::AppState;

pub fn init_answers_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_answer))
        .route("/search", post(search_answers))
        .route(
            "/{test_id}/{class_id}/{user_id}",
            get(get_answer).put(update_answer).delete(delete_answer),
        )
}
