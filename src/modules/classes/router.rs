use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use super::controller::{
    add_professor, create_class, delete_class, enroll_student, get_class, list_professors,
    list_students, remove_professor, search_classes, set_hidden, unenroll_student, update_class,
};
use crate::modules::resources::controller::list_class_resources;
use crate::modules::tests::controller::list_class_tests;
use crate::state::AppState;

pub fn init_classes_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_class))
        .route("/search", post(search_classes))
        .route("/{id}", get(get_class).put(update_class).delete(delete_class))
        .route("/{id}/students", get(list_students).post(enroll_student))
        .route("/{id}/students/me", patch(set_hidden))
        .route("/{id}/students/{student_id}", delete(unenroll_student))
        .route("/{id}/professors", get(list_professors).post(add_professor))
        .route("/{id}/professors/{professor_id}", delete(remove_professor))
        .route("/{id}/tests", get(list_class_tests))
        .route("/{id}/resources", get(list_class_resources))
}
