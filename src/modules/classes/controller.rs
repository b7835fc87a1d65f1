use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use eduzas_core::{AppError, Paginated, PaginationParams};
use eduzas_models::classes::{
    AddProfessorDto, Class, ClassCriteria, ClassProfessor, CreateClassDto, EnrollStudentDto,
    Enrollment, SetHiddenDto, UpdateClassDto,
};
use eduzas_models::users::User;
use tracing::instrument;
use uuid::Uuid;

use super::service::ClassService;
use crate::middleware::auth::{AuthUser, RequireContentCreator, RequireStudent};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create a class
#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = CreateClassDto,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 400, description = "Admins must name a professor as owner", body = ErrorResponse),
        (status = 403, description = "Students cannot create classes", body = ErrorResponse),
        (status = 404, description = "Owner not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state, dto))]
pub async fn create_class(
    State(state): State<AppState>,
    RequireContentCreator(auth_user): RequireContentCreator,
    ValidatedJson(dto): ValidatedJson<CreateClassDto>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let class =
        ClassService::create_class(&state.db, auth_user.user_id(), auth_user.role(), dto).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

/// Search classes visible to the caller
#[utoipa::path(
    post,
    path = "/api/classes/search",
    request_body = ClassCriteria,
    responses(
        (status = 200, description = "Page of classes", body = Paginated<Class>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn search_classes(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(criteria): ValidatedJson<ClassCriteria>,
) -> Result<Json<Paginated<Class>>, AppError> {
    let page =
        ClassService::search_classes(&state.db, auth_user.user_id(), auth_user.role(), criteria)
            .await?;
    Ok(Json(page))
}

/// Get a class
#[utoipa::path(
    get,
    path = "/api/classes/{id}",
    params(("id" = String, Path, description = "Class code")),
    responses(
        (status = 200, description = "Class", body = Class),
        (status = 403, description = "Not a member of the class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn get_class(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Class>, AppError> {
    let class = ClassService::get_class(&state.db, auth_user.user_id(), auth_user.role(), &id).await?;
    Ok(Json(class))
}

/// Update a class
#[utoipa::path(
    put,
    path = "/api/classes/{id}",
    params(("id" = String, Path, description = "Class code")),
    request_body = UpdateClassDto,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 403, description = "Only owners and admins", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn update_class(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateClassDto>,
) -> Result<Json<Class>, AppError> {
    let class =
        ClassService::update_class(&state.db, auth_user.user_id(), auth_user.role(), &id, dto)
            .await?;
    Ok(Json(class))
}

/// Delete a class
#[utoipa::path(
    delete,
    path = "/api/classes/{id}",
    params(("id" = String, Path, description = "Class code")),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 403, description = "Only owners and admins", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn delete_class(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    ClassService::delete_class(&state.db, auth_user.user_id(), auth_user.role(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Enroll a student
///
/// Students enroll themselves. Admins must send `student_id`.
#[utoipa::path(
    post,
    path = "/api/classes/{id}/students",
    params(("id" = String, Path, description = "Class code")),
    request_body = EnrollStudentDto,
    responses(
        (status = 201, description = "Enrolled", body = Enrollment),
        (status = 400, description = "Class inactive or target is not a student", body = ErrorResponse),
        (status = 403, description = "Professors cannot enroll", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 409, description = "Already enrolled", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn enroll_student(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    body: Option<ValidatedJson<EnrollStudentDto>>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let dto = body.map(|ValidatedJson(dto)| dto).unwrap_or_default();
    let enrollment =
        ClassService::enroll_student(&state.db, auth_user.user_id(), auth_user.role(), &id, dto)
            .await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// Remove a student from a class
#[utoipa::path(
    delete,
    path = "/api/classes/{id}/students/{student_id}",
    params(
        ("id" = String, Path, description = "Class code"),
        ("student_id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 204, description = "Student removed"),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Not enrolled", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn unenroll_student(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, student_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, AppError> {
    ClassService::unenroll_student(
        &state.db,
        auth_user.user_id(),
        auth_user.role(),
        &id,
        student_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Hide or show a class in the caller's listing
#[utoipa::path(
    patch,
    path = "/api/classes/{id}/students/me",
    params(("id" = String, Path, description = "Class code")),
    request_body = SetHiddenDto,
    responses(
        (status = 200, description = "Enrollment updated", body = Enrollment),
        (status = 403, description = "Students only", body = ErrorResponse),
        (status = 404, description = "Not enrolled", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn set_hidden(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<SetHiddenDto>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment =
        ClassService::set_hidden(&state.db, student.user_id(), &id, dto.hidden).await?;
    Ok(Json(enrollment))
}

/// List enrolled students
#[utoipa::path(
    get,
    path = "/api/classes/{id}/students",
    params(("id" = String, Path, description = "Class code"), PaginationParams),
    responses(
        (status = 200, description = "Page of students", body = Paginated<User>),
        (status = 403, description = "Only professors of the class and admins", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn list_students(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<Paginated<User>>, AppError> {
    let page = ClassService::list_students(
        &state.db,
        auth_user.user_id(),
        auth_user.role(),
        &id,
        pagination,
    )
    .await?;
    Ok(Json(page))
}

/// Add a professor to a class
#[utoipa::path(
    post,
    path = "/api/classes/{id}/professors",
    params(("id" = String, Path, description = "Class code")),
    request_body = AddProfessorDto,
    responses(
        (status = 201, description = "Professor added", body = ClassProfessor),
        (status = 400, description = "Target is not a professor", body = ErrorResponse),
        (status = 403, description = "Only owners and admins", body = ErrorResponse),
        (status = 409, description = "Already teaches the class", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn add_professor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<AddProfessorDto>,
) -> Result<(StatusCode, Json<ClassProfessor>), AppError> {
    let professor =
        ClassService::add_professor(&state.db, auth_user.user_id(), auth_user.role(), &id, dto)
            .await?;
    Ok((StatusCode::CREATED, Json(professor)))
}

/// Remove a professor from a class
#[utoipa::path(
    delete,
    path = "/api/classes/{id}/professors/{professor_id}",
    params(
        ("id" = String, Path, description = "Class code"),
        ("professor_id" = Uuid, Path, description = "Professor ID")
    ),
    responses(
        (status = 204, description = "Professor removed"),
        (status = 400, description = "Cannot remove the last owner", body = ErrorResponse),
        (status = 403, description = "Only owners and admins", body = ErrorResponse),
        (status = 404, description = "Professor does not teach the class", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn remove_professor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, professor_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, AppError> {
    ClassService::remove_professor(
        &state.db,
        auth_user.user_id(),
        auth_user.role(),
        &id,
        professor_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the professors of a class
#[utoipa::path(
    get,
    path = "/api/classes/{id}/professors",
    params(("id" = String, Path, description = "Class code")),
    responses(
        (status = 200, description = "Professors, owners first", body = Vec<ClassProfessor>),
        (status = 403, description = "Not a member of the class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn list_professors(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<ClassProfessor>>, AppError> {
    let professors =
        ClassService::list_professors(&state.db, auth_user.user_id(), auth_user.role(), &id)
            .await?;
    Ok(Json(professors))
}
