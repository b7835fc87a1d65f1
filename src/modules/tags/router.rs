use axum::{
    Router,
    routing::{delete, post},
};

use super::controller::{create_tag, delete_tag, search_tags};
use crate::state::AppState;

pub fn init_tags_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_tag))
        .route("/search", post(search_tags))
        .route("/{text}", delete(delete_tag))
}
