use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eduzas_core::{AppError, Paginated, PaginationParams};
use eduzas_models::resources::{
    AssignResourceDto, ClassResource, CreateResourceDto, Resource, ResourceCriteria,
    ResourceInClass, SetHiddenResourceDto, UpdateResourceDto,
};
use tracing::instrument;
use uuid::Uuid;

use super::service::ResourceService;
use crate::middleware::auth::{AuthUser, RequireContentCreator};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/resources",
    request_body = CreateResourceDto,
    responses(
        (status = 201, description = "Resource created", body = Resource),
        (status = 400, description = "Admins must name a professor", body = ErrorResponse),
        (status = 403, description = "Students cannot create resources", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Resources"
)]
#[instrument(skip(state, dto))]
pub async fn create_resource(
    State(state): State<AppState>,
    RequireContentCreator(auth_user): RequireContentCreator,
    ValidatedJson(dto): ValidatedJson<CreateResourceDto>,
) -> Result<(StatusCode, Json<Resource>), AppError> {
    let resource =
        ResourceService::create_resource(&state.db, auth_user.user_id(), auth_user.role(), dto)
            .await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

#[utoipa::path(
    post,
    path = "/api/resources/search",
    request_body = ResourceCriteria,
    responses(
        (status = 200, description = "Page of resources", body = Paginated<Resource>)
    ),
    security(("bearer_auth" = [])),
    tag = "Resources"
)]
#[instrument(skip(state))]
pub async fn search_resources(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(criteria): ValidatedJson<ResourceCriteria>,
) -> Result<Json<Paginated<Resource>>, AppError> {
    let page = ResourceService::search_resources(
        &state.db,
        auth_user.user_id(),
        auth_user.role(),
        criteria,
    )
    .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource ID")),
    responses(
        (status = 200, description = "Resource", body = Resource),
        (status = 403, description = "Not shared with the caller", body = ErrorResponse),
        (status = 404, description = "Resource not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Resources"
)]
#[instrument(skip(state))]
pub async fn get_resource(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Resource>, AppError> {
    let resource =
        ResourceService::get_resource(&state.db, auth_user.user_id(), auth_user.role(), id).await?;
    Ok(Json(resource))
}

#[utoipa::path(
    put,
    path = "/api/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource ID")),
    request_body = UpdateResourceDto,
    responses(
        (status = 200, description = "Resource updated", body = Resource),
        (status = 403, description = "Only the owner and admins", body = ErrorResponse),
        (status = 404, description = "Resource not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Resources"
)]
#[instrument(skip(state, dto))]
pub async fn update_resource(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateResourceDto>,
) -> Result<Json<Resource>, AppError> {
    let resource =
        ResourceService::update_resource(&state.db, auth_user.user_id(), auth_user.role(), id, dto)
            .await?;
    Ok(Json(resource))
}

#[utoipa::path(
    delete,
    path = "/api/resources/{id}",
    params(("id" = Uuid, Path, description = "Resource ID")),
    responses(
        (status = 204, description = "Resource deleted"),
        (status = 403, description = "Only the owner and admins", body = ErrorResponse),
        (status = 404, description = "Resource not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Resources"
)]
#[instrument(skip(state))]
pub async fn delete_resource(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ResourceService::delete_resource(&state.db, auth_user.user_id(), auth_user.role(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Share a resource with a class
#[utoipa::path(
    post,
    path = "/api/resources/{id}/classes",
    params(("id" = Uuid, Path, description = "Resource ID")),
    request_body = AssignResourceDto,
    responses(
        (status = 201, description = "Resource shared", body = ClassResource),
        (status = 403, description = "Only the owner teaching the class, or admins", body = ErrorResponse),
        (status = 404, description = "Resource or class not found", body = ErrorResponse),
        (status = 409, description = "Already shared", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Resources"
)]
#[instrument(skip(state))]
pub async fn attach_resource(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AssignResourceDto>,
) -> Result<(StatusCode, Json<ClassResource>), AppError> {
    let attachment =
        ResourceService::attach_to_class(&state.db, auth_user.user_id(), auth_user.role(), id, dto)
            .await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

/// Hide or show a resource in a class
#[utoipa::path(
    patch,
    path = "/api/resources/{id}/classes/{class_id}",
    params(
        ("id" = Uuid, Path, description = "Resource ID"),
        ("class_id" = String, Path, description = "Class code")
    ),
    request_body = SetHiddenResourceDto,
    responses(
        (status = 200, description = "Flag updated", body = ClassResource),
        (status = 403, description = "Only the owner teaching the class, or admins", body = ErrorResponse),
        (status = 404, description = "Not shared with the class", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Resources"
)]
#[instrument(skip(state))]
pub async fn set_resource_hidden(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, class_id)): Path<(Uuid, String)>,
    ValidatedJson(dto): ValidatedJson<SetHiddenResourceDto>,
) -> Result<Json<ClassResource>, AppError> {
    let attachment = ResourceService::set_hidden(
        &state.db,
        auth_user.user_id(),
        auth_user.role(),
        id,
        &class_id,
        dto.hidden,
    )
    .await?;
    Ok(Json(attachment))
}

/// Stop sharing a resource with a class
#[utoipa::path(
    delete,
    path = "/api/resources/{id}/classes/{class_id}",
    params(
        ("id" = Uuid, Path, description = "Resource ID"),
        ("class_id" = String, Path, description = "Class code")
    ),
    responses(
        (status = 204, description = "Resource detached"),
        (status = 403, description = "Only the owner teaching the class, or admins", body = ErrorResponse),
        (status = 404, description = "Not shared with the class", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Resources"
)]
#[instrument(skip(state))]
pub async fn detach_resource(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, class_id)): Path<(Uuid, String)>,
) -> Result<StatusCode, AppError> {
    ResourceService::detach_from_class(
        &state.db,
        auth_user.user_id(),
        auth_user.role(),
        id,
        &class_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Resources shared with a class
#[utoipa::path(
    get,
    path = "/api/classes/{id}/resources",
    params(("id" = String, Path, description = "Class code"), PaginationParams),
    responses(
        (status = 200, description = "Page of resources; students do not get hidden ones", body = Paginated<ResourceInClass>),
        (status = 403, description = "Not a member of the class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn list_class_resources(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<Paginated<ResourceInClass>>, AppError> {
    let page = ResourceService::list_class_resources(
        &state.db,
        auth_user.user_id(),
        auth_user.role(),
        &id,
        pagination,
    )
    .await?;
    Ok(Json(page))
}
