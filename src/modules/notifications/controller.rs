use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use eduzas_core::{AppError, Paginated};
use eduzas_models::notifications::{
    CreateNotificationDto, MarkReadDto, NotificationCreated, NotificationCriteria,
    UserNotification,
};
use tracing::instrument;
use uuid::Uuid;

use super::service::NotificationService;
use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Publish a notification to a class
#[utoipa::path(
    post,
    path = "/api/notifications",
    request_body = CreateNotificationDto,
    responses(
        (status = 201, description = "Notification published", body = NotificationCreated),
        (status = 403, description = "Only professors of the class and admins", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip(state, dto))]
pub async fn create_notification(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateNotificationDto>,
) -> Result<(StatusCode, Json<NotificationCreated>), AppError> {
    let created = NotificationService::create_notification(
        &state.db,
        &state.email,
        auth_user.user_id(),
        auth_user.role(),
        dto,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Search the caller's notifications
#[utoipa::path(
    post,
    path = "/api/notifications/search",
    request_body = NotificationCriteria,
    responses(
        (status = 200, description = "Page of notifications, newest first", body = Paginated<UserNotification>)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip(state))]
pub async fn search_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(criteria): ValidatedJson<NotificationCriteria>,
) -> Result<Json<Paginated<UserNotification>>, AppError> {
    let page =
        NotificationService::search_notifications(&state.db, auth_user.user_id(), criteria)
            .await?;
    Ok(Json(page))
}

/// Mark a notification as read or unread
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    request_body = MarkReadDto,
    responses(
        (status = 204, description = "Updated"),
        (status = 404, description = "Not in the caller's inbox", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip(state))]
pub async fn mark_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    body: Option<ValidatedJson<MarkReadDto>>,
) -> Result<StatusCode, AppError> {
    let dto = body.map(|ValidatedJson(dto)| dto).unwrap_or_default();
    NotificationService::mark_read(&state.db, auth_user.user_id(), id, dto.readed).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a notification
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 403, description = "Only professors of the class and admins", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip(state))]
pub async fn delete_notification(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    NotificationService::delete_notification(&state.db, auth_user.user_id(), auth_user.role(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
