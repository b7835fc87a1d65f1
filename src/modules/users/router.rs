use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    change_password, create_user, delete_user, get_me, get_user, search_users, update_me,
    update_user,
};
use crate::state::AppState;

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/search", post(search_users))
        .route("/me", get(get_me).put(update_me))
        .route("/me/change-password", post(change_password))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}
