use axum::{
    Router,
    routing::{get, patch, post},
};

use super::controller::{
    attach_resource, create_resource, delete_resource, detach_resource, get_resource,
    search_resources, set_resource_hidden, update_resource,
};
use crate::state::AppState;

pub fn init_resources_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_resource))
        .route("/search", post(search_resources))
        .route(
            "/{id}",
            get(get_resource).put(update_resource).delete(delete_resource),
        )
        .route("/{id}/classes", post(attach_resource))
        .route(
            "/{id}/classes/{class_id}",
            patch(set_resource_hidden).delete(detach_resource),
        )
}
