use axum::{
    Router,
    routing::{delete, patch, post},
};

use super::controller::{
    create_notification, delete_notification, mark_read, search_notifications,
};
use crate::state::AppState;

pub fn init_notifications_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_notification))
        .route("/search", post(search_notifications))
        .route("/{id}", delete(delete_notification))
        .route("/{id}/read", patch(mark_read))
}
