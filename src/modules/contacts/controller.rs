use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use eduzas_core::{AppError, Paginated};
use eduzas_models::contacts::{
    AddContactTagDto, Contact, ContactCriteria, CreateContactDto, UpdateContactDto,
};
use tracing::instrument;
use uuid::Uuid;

use super::service::ContactService;
use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Add a user to the caller's agenda
#[utoipa::path(
    post,
    path = "/api/contacts",
    request_body = CreateContactDto,
    responses(
        (status = 201, description = "Contact created", body = Contact),
        (status = 400, description = "Cannot add yourself", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Contact already exists", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
#[instrument(skip(state, dto))]
pub async fn create_contact(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateContactDto>,
) -> Result<(StatusCode, Json<Contact>), AppError> {
    let contact = ContactService::create_contact(&state.db, auth_user.user_id(), dto).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// Search the caller's agenda
///
/// Admins may pass `agenda_owner_id` to search another agenda.
#[utoipa::path(
    post,
    path = "/api/contacts/search",
    request_body = ContactCriteria,
    responses(
        (status = 200, description = "Page of contacts", body = Paginated<Contact>)
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
#[instrument(skip(state))]
pub async fn search_contacts(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(criteria): ValidatedJson<ContactCriteria>,
) -> Result<Json<Paginated<Contact>>, AppError> {
    let page = ContactService::search_contacts(
        &state.db,
        auth_user.user_id(),
        auth_user.role(),
        criteria,
    )
    .await?;
    Ok(Json(page))
}

/// Get an agenda entry
#[utoipa::path(
    get,
    path = "/api/contacts/{user_id}",
    params(("user_id" = Uuid, Path, description = "Contacted user ID")),
    responses(
        (status = 200, description = "Contact", body = Contact),
        (status = 404, description = "Contact not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
#[instrument(skip(state))]
pub async fn get_contact(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Contact>, AppError> {
    let contact = ContactService::get_contact(&state.db, auth_user.user_id(), user_id).await?;
    Ok(Json(contact))
}

/// Update an agenda entry
#[utoipa::path(
    put,
    path = "/api/contacts/{user_id}",
    params(("user_id" = Uuid, Path, description = "Contacted user ID")),
    request_body = UpdateContactDto,
    responses(
        (status = 200, description = "Contact updated", body = Contact),
        (status = 404, description = "Contact not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
#[instrument(skip(state, dto))]
pub async fn update_contact(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateContactDto>,
) -> Result<Json<Contact>, AppError> {
    let contact =
        ContactService::update_contact(&state.db, auth_user.user_id(), user_id, dto).await?;
    Ok(Json(contact))
}

/// Remove an agenda entry
#[utoipa::path(
    delete,
    path = "/api/contacts/{user_id}",
    params(("user_id" = Uuid, Path, description = "Contacted user ID")),
    responses(
        (status = 204, description = "Contact deleted"),
        (status = 404, description = "Contact not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
#[instrument(skip(state))]
pub async fn delete_contact(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ContactService::delete_contact(&state.db, auth_user.user_id(), user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Tag an agenda entry
#[utoipa::path(
    post,
    path = "/api/contacts/{user_id}/tags",
    params(("user_id" = Uuid, Path, description = "Contacted user ID")),
    request_body = AddContactTagDto,
    responses(
        (status = 201, description = "Tag added", body = Contact),
        (status = 404, description = "Contact not found", body = ErrorResponse),
        (status = 409, description = "Already tagged", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
#[instrument(skip(state))]
pub async fn add_contact_tag(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AddContactTagDto>,
) -> Result<(StatusCode, Json<Contact>), AppError> {
    let contact = ContactService::add_tag(&state.db, auth_user.user_id(), user_id, dto).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// Untag an agenda entry
#[utoipa::path(
    delete,
    path = "/api/contacts/{user_id}/tags/{tag}",
    params(
        ("user_id" = Uuid, Path, description = "Contacted user ID"),
        ("tag" = String, Path, description = "Tag text")
    ),
    responses(
        (status = 204, description = "Tag removed"),
        (status = 404, description = "Contact does not carry the tag", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
#[instrument(skip(state))]
pub async fn remove_contact_tag(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((user_id, tag)): Path<(Uuid, String)>,
) -> Result<StatusCode, AppError> {
    ContactService::remove_tag(&state.db, auth_user.user_id(), user_id, &tag).await?;
    Ok(StatusCode::NO_CONTENT)
}
