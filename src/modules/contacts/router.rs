use axum::{
    Router,
    routing::{delete, get, post},
};

use super::controller::{
    add_contact_tag, create_contact, delete_contact, get_contact, remove_contact_tag,
    search_contacts, update_contact,
};
use crate::state::AppState;

pub fn init_contacts_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_contact))
        .route("/search", post(search_contacts))
        .route(
            "/{user_id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route("/{user_id}/tags", post(add_contact_tag))
        .route("/{user_id}/tags/{tag}", delete(remove_contact_tag))
}
