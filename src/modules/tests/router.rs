use axum::{
    Router,
    routing::{get, patch, post},
};

use super::controller::{
    assign_test, create_test, delete_test, get_test, remove_test_from_class, search_tests,
    set_test_visibility, update_test,
};
use crate::state::AppState;

pub fn init_tests_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_test))
        .route("/search", post(search_tests))
        .route("/{id}", get(get_test).put(update_test).delete(delete_test))
        .route("/{id}/classes", post(assign_test))
        .route(
            "/{id}/classes/{class_id}",
            patch(set_test_visibility).delete(remove_test_from_class),
        )
}
