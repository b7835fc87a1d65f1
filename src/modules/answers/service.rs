use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use eduzas_auth::Role;
use eduzas_auth::policy::{SearchScope, can_moderate_class, can_view_answer, scope_for};
use eduzas_core::{AppError, Paginated};
use eduzas_db::{Filters, fetch_page};
use eduzas_models::answers::{Answer, AnswerCriteria, CreateAnswerDto, UpdateAnswerDto};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::classes::class_access;
use crate::utils::db::conflict_on_unique;

const TAUGHT_BY: &str = "EXISTS (SELECT 1 FROM class_professors cp \
     WHERE cp.class_id = a.class_id AND cp.professor_id = ";

/// Identifies one answer: a student's answer to a test in a class.
#[derive(Debug, Clone, Copy)]
pub struct AnswerKey<'a> {
    pub test_id: Uuid,
    pub class_id: &'a str,
    pub user_id: Uuid,
}

/// Whether an answer started at `created_at` may still change at `now`.
pub fn within_time_limit(
    created_at: DateTime<Utc>,
    time_limit_minutes: Option<i32>,
    now: DateTime<Utc>,
) -> bool {
    match time_limit_minutes {
        Some(minutes) => now <= created_at + Duration::minutes(i64::from(minutes)),
        None => true,
    }
}

pub struct AnswerService;

impl AnswerService {
    async fn fetch_answer(db: &PgPool, key: AnswerKey<'_>) -> Result<Answer, AppError> {
        sqlx::query_as::<_, Answer>(
            "SELECT * FROM answers WHERE test_id = $1 AND class_id = $2 AND user_id = $3",
        )
        .bind(key.test_id)
        .bind(key.class_id)
        .bind(key.user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Answer not found")))
    }

    /// Students answer visible, active tests of classes they are enrolled in.
    #[instrument(skip(db, dto), fields(test_id = %dto.test_id, class_id = %dto.class_id))]
    pub async fn create_answer(
        db: &PgPool,
        student_id: Uuid,
        dto: CreateAnswerDto,
    ) -> Result<Answer, AppError> {
        let access = class_access(db, &dto.class_id, student_id).await?;
        if !access.is_enrolled {
            return Err(AppError::forbidden("You are not enrolled in this class"));
        }

        let assignment: Option<(bool, bool)> = sqlx::query_as(
            "SELECT tpc.visible, t.active
             FROM test_per_class tpc
             JOIN tests t ON t.id = tpc.test_id
             WHERE tpc.test_id = $1 AND tpc.class_id = $2",
        )
        .bind(dto.test_id)
        .bind(&dto.class_id)
        .fetch_optional(db)
        .await?;

        match assignment {
            Some((true, true)) => {}
            Some((true, false)) => {
                return Err(AppError::bad_request(anyhow!("Test is not active")));
            }
            _ => {
                return Err(AppError::not_found(anyhow!(
                    "Test is not available in this class"
                )));
            }
        }

        let answer = sqlx::query_as::<_, Answer>(
            "INSERT INTO answers (user_id, test_id, class_id, content)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(student_id)
        .bind(dto.test_id)
        .bind(&dto.class_id)
        .bind(Json(&dto.content))
        .fetch_one(db)
        .await
        .map_err(|e| conflict_on_unique(e, "You already answered this test in this class"))?;

        info!(user_id = %student_id, "Answer submitted");
        Ok(answer)
    }

    #[instrument(skip(db))]
    pub async fn get_answer(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        key: AnswerKey<'_>,
    ) -> Result<Answer, AppError> {
        let answer = Self::fetch_answer(db, key).await?;
        let access = class_access(db, key.class_id, caller_id).await?;
        if !can_view_answer(caller_role, key.user_id == caller_id, access) {
            return Err(AppError::forbidden("You cannot view this answer"));
        }
        Ok(answer)
    }

    /// Only the author may edit, and only within the test's time limit.
    #[instrument(skip(db, dto))]
    pub async fn update_answer(
        db: &PgPool,
        caller_id: Uuid,
        key: AnswerKey<'_>,
        dto: UpdateAnswerDto,
    ) -> Result<Answer, AppError> {
        if key.user_id != caller_id {
            return Err(AppError::forbidden("Only the author can update an answer"));
        }

        let answer = Self::fetch_answer(db, key).await?;
        let time_limit: Option<i32> =
            sqlx::query_scalar("SELECT time_limit_minutes FROM tests WHERE id = $1")
                .bind(key.test_id)
                .fetch_one(db)
                .await?;

        if !within_time_limit(answer.created_at, time_limit, Utc::now()) {
            return Err(AppError::bad_request(anyhow!("Time limit exceeded")));
        }

        let answer = sqlx::query_as::<_, Answer>(
            "UPDATE answers SET content = $1, modified_at = NOW()
             WHERE test_id = $2 AND class_id = $3 AND user_id = $4
             RETURNING *",
        )
        .bind(Json(&dto.content))
        .bind(key.test_id)
        .bind(key.class_id)
        .bind(key.user_id)
        .fetch_one(db)
        .await?;

        Ok(answer)
    }

    #[instrument(skip(db))]
    pub async fn delete_answer(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        key: AnswerKey<'_>,
    ) -> Result<(), AppError> {
        let access = class_access(db, key.class_id, caller_id).await?;
        if !can_moderate_class(caller_role, access) {
            return Err(AppError::forbidden(
                "Only professors of the class can delete answers",
            ));
        }

        let result = sqlx::query(
            "DELETE FROM answers WHERE test_id = $1 AND class_id = $2 AND user_id = $3",
        )
        .bind(key.test_id)
        .bind(key.class_id)
        .bind(key.user_id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Answer not found")));
        }

        info!(test_id = %key.test_id, class_id = %key.class_id, user_id = %key.user_id, "Answer deleted");
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn search_answers(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        criteria: AnswerCriteria,
    ) -> Result<Paginated<Answer>, AppError> {
        let mut filters = Filters::new();
        filters
            .where_optional("a.test_id", criteria.test_id)
            .where_optional("a.class_id", criteria.class_id);

        match scope_for(caller_role, caller_id) {
            SearchScope::Student(student_id) => {
                filters.where_optional("a.user_id", Some(student_id));
            }
            SearchScope::Professor(professor_id) => {
                filters
                    .where_bound(TAUGHT_BY, professor_id, ")")
                    .where_optional("a.user_id", criteria.user_id);
            }
            SearchScope::Everything => {
                filters.where_optional("a.user_id", criteria.user_id);
            }
        }

        let page = fetch_page::<Answer>(
            db,
            "SELECT a.* FROM answers a",
            "SELECT COUNT(*) FROM answers a",
            &filters,
            "a.created_at DESC, a.user_id",
            &criteria.pagination,
        )
        .await?;

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::classes::service::ClassService;
    use crate::modules::tests::service::TestService;
    use crate::modules::users::service::UserService;
    use axum::http::StatusCode;
    use eduzas_models::Email;
    use eduzas_models::classes::CreateClassDto;
    use eduzas_models::tests::{AssignTestDto, CreateTestDto};
    use eduzas_models::users::{CreateUserDto, User};
    use serde_json::json;

    #[test]
    fn test_within_time_limit() {
        let start = Utc::now();
        assert!(within_time_limit(start, None, start + Duration::days(30)));
        assert!(within_time_limit(start, Some(10), start + Duration::minutes(10)));
        assert!(!within_time_limit(start, Some(10), start + Duration::minutes(11)));
    }

    async fn user(pool: &PgPool, email: &str, role: Role) -> User {
        UserService::create_user(
            pool,
            CreateUserDto {
                email: Email::new(email).unwrap(),
                password: "password123".to_string(),
                first_name: "Test".to_string(),
                mid_name: None,
                father_lastname: "User".to_string(),
                mother_lastname: None,
                role,
            },
        )
        .await
        .unwrap()
    }

    struct Setup {
        prof: User,
        student: User,
        class_id: String,
        test_id: Uuid,
    }

    async fn setup(pool: &PgPool, visible: bool) -> Setup {
        let prof = user(pool, "prof@example.com", Role::Professor).await;
        let student = user(pool, "student@example.com", Role::Student).await;
        let class_id = ClassService::create_class(
            pool,
            prof.id,
            Role::Professor,
            CreateClassDto {
                class_name: "Chemistry".to_string(),
                subject: None,
                section: None,
                color: None,
                owner_id: None,
            },
        )
        .await
        .unwrap()
        .id;
        ClassService::enroll_student(pool, student.id, Role::Student, &class_id, Default::default())
            .await
            .unwrap();
        let test_id = TestService::create_test(
            pool,
            prof.id,
            Role::Professor,
            CreateTestDto {
                title: "Quiz".to_string(),
                color: None,
                content: json!({"questions": []}),
                time_limit_minutes: None,
                professor_id: None,
            },
        )
        .await
        .unwrap()
        .id;
        TestService::assign_to_class(
            pool,
            prof.id,
            Role::Professor,
            test_id,
            AssignTestDto {
                class_id: class_id.clone(),
                visible,
            },
        )
        .await
        .unwrap();

        Setup {
            prof,
            student,
            class_id,
            test_id,
        }
    }

    fn answer_dto(s: &Setup) -> CreateAnswerDto {
        CreateAnswerDto {
            test_id: s.test_id,
            class_id: s.class_id.clone(),
            content: json!({"answers": [4]}),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_answer_lifecycle(pool: PgPool) {
        let s = setup(&pool, true).await;

        let answer = AnswerService::create_answer(&pool, s.student.id, answer_dto(&s))
            .await
            .unwrap();
        assert_eq!(answer.user_id, s.student.id);

        let err = AnswerService::create_answer(&pool, s.student.id, answer_dto(&s))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let key = AnswerKey {
            test_id: s.test_id,
            class_id: &s.class_id,
            user_id: s.student.id,
        };

        let updated = AnswerService::update_answer(
            &pool,
            s.student.id,
            key,
            UpdateAnswerDto {
                content: json!({"answers": [5]}),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.content.0, json!({"answers": [5]}));

        let err = AnswerService::update_answer(
            &pool,
            s.prof.id,
            key,
            UpdateAnswerDto {
                content: json!({}),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let seen = AnswerService::get_answer(&pool, s.prof.id, Role::Professor, key)
            .await
            .unwrap();
        assert_eq!(seen.user_id, s.student.id);

        let page = AnswerService::search_answers(
            &pool,
            s.prof.id,
            Role::Professor,
            serde_json::from_value(json!({ "class_id": s.class_id })).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(page.meta.total, 1);

        let err = AnswerService::delete_answer(&pool, s.student.id, Role::Student, key)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        AnswerService::delete_answer(&pool, s.prof.id, Role::Professor, key)
            .await
            .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_hidden_test_cannot_be_answered(pool: PgPool) {
        let s = setup(&pool, false).await;
        let err = AnswerService::create_answer(&pool, s.student.id, answer_dto(&s))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_outsider_cannot_answer(pool: PgPool) {
        let s = setup(&pool, true).await;
        let outsider = user(&pool, "outsider@example.com", Role::Student).await;
        let err = AnswerService::create_answer(&pool, outsider.id, answer_dto(&s))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }
}
