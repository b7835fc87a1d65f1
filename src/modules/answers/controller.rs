use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use eduzas_core::{AppError, Paginated};
use eduzas_models::answers::{Answer, AnswerCriteria, CreateAnswerDto, UpdateAnswerDto};
use tracing::instrument;
use uuid::Uuid;

use super::service::{AnswerKey, AnswerService};
use crate::middleware::auth::{AuthUser, RequireStudent};
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

type AnswerPath = Path<(Uuid, String, Uuid)>;

/// Submit an answer
#[utoipa::path(
    post,
    path = "/api/answers",
    request_body = CreateAnswerDto,
    responses(
        (status = 201, description = "Answer submitted", body = Answer),
        (status = 400, description = "Test is not active", body = ErrorResponse),
        (status = 403, description = "Students enrolled in the class only", body = ErrorResponse),
        (status = 404, description = "Test not available in the class", body = ErrorResponse),
        (status = 409, description = "Already answered", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Answers"
)]
#[instrument(skip(state, dto))]
pub async fn create_answer(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
    ValidatedJson(dto): ValidatedJson<CreateAnswerDto>,
) -> Result<(StatusCode, Json<Answer>), AppError> {
    let answer = AnswerService::create_answer(&state.db, student.user_id(), dto).await?;
    Ok((StatusCode::CREATED, Json(answer)))
}

/// Search answers
///
/// Students only see their own answers and professors those of classes they teach.
#[utoipa::path(
    post,
    path = "/api/answers/search",
    request_body = AnswerCriteria,
    responses(
        (status = 200, description = "Page of answers", body = Paginated<Answer>)
    ),
    security(("bearer_auth" = [])),
    tag = "Answers"
)]
#[instrument(skip(state))]
pub async fn search_answers(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(criteria): ValidatedJson<AnswerCriteria>,
) -> Result<Json<Paginated<Answer>>, AppError> {
    let page =
        AnswerService::search_answers(&state.db, auth_user.user_id(), auth_user.role(), criteria)
            .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/answers/{test_id}/{class_id}/{user_id}",
    params(
        ("test_id" = Uuid, Path, description = "Test ID"),
        ("class_id" = String, Path, description = "Class code"),
        ("user_id" = Uuid, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Answer", body = Answer),
        (status = 403, description = "Author, professors of the class and admins only", body = ErrorResponse),
        (status = 404, description = "Answer not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Answers"
)]
#[instrument(skip(state))]
pub async fn get_answer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((test_id, class_id, user_id)): AnswerPath,
) -> Result<Json<Answer>, AppError> {
    let key = AnswerKey {
        test_id,
        class_id: &class_id,
        user_id,
    };
    let answer =
        AnswerService::get_answer(&state.db, auth_user.user_id(), auth_user.role(), key).await?;
    Ok(Json(answer))
}

#[utoipa::path(
    put,
    path = "/api/answers/{test_id}/{class_id}/{user_id}",
    params(
        ("test_id" = Uuid, Path, description = "Test ID"),
        ("class_id" = String, Path, description = "Class code"),
        ("user_id" = Uuid, Path, description = "Author ID")
    ),
    request_body = UpdateAnswerDto,
    responses(
        (status = 200, description = "Answer updated", body = Answer),
        (status = 400, description = "Time limit exceeded", body = ErrorResponse),
        (status = 403, description = "Author only", body = ErrorResponse),
        (status = 404, description = "Answer not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Answers"
)]
#[instrument(skip(state, dto))]
pub async fn update_answer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((test_id, class_id, user_id)): AnswerPath,
    ValidatedJson(dto): ValidatedJson<UpdateAnswerDto>,
) -> Result<Json<Answer>, AppError> {
    let key = AnswerKey {
        test_id,
        class_id: &class_id,
        user_id,
    };
    let answer = AnswerService::update_answer(&state.db, auth_user.user_id(), key, dto).await?;
    Ok(Json(answer))
}

#[utoipa::path(
    delete,
    path = "/api/answers/{test_id}/{class_id}/{user_id}",
    params(
        ("test_id" = Uuid, Path, description = "Test ID"),
        ("class_id" = String, Path, description = "Class code"),
        ("user_id" = Uuid, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Answer deleted"),
        (status = 403, description = "Professors of the class and admins only", body = ErrorResponse),
        (status = 404, description = "Answer not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Answers"
)]
#[instrument(skip(state))]
pub async fn delete_answer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((test_id, class_id, user_id)): AnswerPath,
) -> Result<StatusCode, AppError> {
    let key = AnswerKey {
        test_id,
        class_id: &class_id,
        user_id,
    };
    AnswerService::delete_answer(&state.db, auth_user.user_id(), auth_user.role(), key).await?;
    Ok(StatusCode::NO_CONTENT)
}
