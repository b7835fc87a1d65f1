use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use eduzas_core::{AppError, Paginated};
use eduzas_models::tags::{CreateTagDto, Tag, TagCriteria};
use tracing::instrument;

use super::service::TagService;
use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create a tag
#[utoipa::path(
    post,
    path = "/api/tags",
    request_body = CreateTagDto,
    responses(
        (status = 201, description = "Tag created", body = Tag),
        (status = 409, description = "Tag already exists", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
#[instrument(skip(state, _auth_user))]
pub async fn create_tag(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateTagDto>,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    let tag = TagService::create_tag(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// Search tags
#[utoipa::path(
    post,
    path = "/api/tags/search",
    request_body = TagCriteria,
    responses(
        (status = 200, description = "Page of tags ordered by text", body = Paginated<Tag>)
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
#[instrument(skip(state, _auth_user))]
pub async fn search_tags(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ValidatedJson(criteria): ValidatedJson<TagCriteria>,
) -> Result<Json<Paginated<Tag>>, AppError> {
    let page = TagService::search_tags(&state.db, criteria).await?;
    Ok(Json(page))
}

/// Delete a tag everywhere
#[utoipa::path(
    delete,
    path = "/api/tags/{text}",
    params(("text" = String, Path, description = "Tag text")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tags"
)]
#[instrument(skip(state))]
pub async fn delete_tag(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(text): Path<String>,
) -> Result<StatusCode, AppError> {
    TagService::delete_tag(&state.db, &text).await?;
    Ok(StatusCode::NO_CONTENT)
}
