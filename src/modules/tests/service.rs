use anyhow::anyhow;
use eduzas_auth::Role;
use eduzas_auth::policy::{
    SearchScope, can_assign_to_class, can_create_content, can_manage_owned, can_moderate_class,
    can_view_class, scope_for,
};
use eduzas_core::{AppError, Paginated, PaginationParams};
use eduzas_db::{Filters, fetch_page};
use eduzas_models::tests::{
    AssignTestDto, ClassTest, CreateTestDto, Test, TestCriteria, TestInClass, UpdateTestDto,
};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::classes::class_access;
use crate::modules::users::service::UserService;
use crate::utils::db::map_insert_error;

const VISIBLE_TO_STUDENT: &str = "EXISTS (SELECT 1 FROM test_per_class tpc
     JOIN class_students cs ON cs.class_id = tpc.class_id
     WHERE tpc.test_id = t.id AND tpc.visible AND cs.student_id = ";
const ASSIGNED_TO_CLASS: &str =
    "EXISTS (SELECT 1 FROM test_per_class tpc WHERE tpc.test_id = t.id AND tpc.class_id = ";

pub struct TestService;

impl TestService {
    pub(crate) async fn fetch_test(db: &PgPool, id: Uuid) -> Result<Test, AppError> {
        sqlx::query_as::<_, Test>("SELECT * FROM tests WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Test not found")))
    }

    #[instrument(skip(db, dto), fields(title = %dto.title))]
    pub async fn create_test(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        dto: CreateTestDto,
    ) -> Result<Test, AppError> {
        if !can_create_content(caller_role) {
            return Err(AppError::forbidden("Only professors and admins can create tests"));
        }

        let professor_id = if caller_role.is_admin() {
            let professor_id = dto.professor_id.ok_or_else(|| {
                AppError::bad_request(anyhow!("professor_id is required when an admin creates a test"))
            })?;
            UserService::ensure_role(db, professor_id, Role::Professor).await?;
            professor_id
        } else {
            caller_id
        };

        let test = sqlx::query_as::<_, Test>(
            "INSERT INTO tests (title, color, content, time_limit_minutes, professor_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(dto.title.trim())
        .bind(dto.color.unwrap_or_default())
        .bind(Json(&dto.content))
        .bind(dto.time_limit_minutes)
        .bind(professor_id)
        .fetch_one(db)
        .await?;

        info!(test_id = %test.id, professor_id = %professor_id, "Test created");
        Ok(test)
    }

    #[instrument(skip(db))]
    pub async fn search_tests(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        criteria: TestCriteria,
    ) -> Result<Paginated<Test>, AppError> {
        let mut filters = Filters::new();
        filters
            .where_string_query("t.title", criteria.title.as_ref())
            .where_optional("t.active", criteria.active);

        match scope_for(caller_role, caller_id) {
            SearchScope::Student(student_id) => {
                match criteria.class_id {
                    Some(class_id) => filters.where_bound_pair(
                        VISIBLE_TO_STUDENT,
                        student_id,
                        " AND tpc.class_id = ",
                        class_id,
                        ")",
                    ),
                    None => filters.where_bound(VISIBLE_TO_STUDENT, student_id, ")"),
                };
                filters.where_optional("t.professor_id", criteria.professor_id);
            }
            SearchScope::Professor(professor_id) => {
                filters
                    .where_optional("t.professor_id", Some(professor_id))
                    .where_bound_optional(ASSIGNED_TO_CLASS, criteria.class_id, ")");
            }
            SearchScope::Everything => {
                filters
                    .where_optional("t.professor_id", criteria.professor_id)
                    .where_bound_optional(ASSIGNED_TO_CLASS, criteria.class_id, ")");
            }
        }

        let page = fetch_page::<Test>(
            db,
            "SELECT t.* FROM tests t",
            "SELECT COUNT(*) FROM tests t",
            &filters,
            "t.created_at DESC, t.id",
            &criteria.pagination,
        )
        .await?;

        Ok(page)
    }

    #[instrument(skip(db))]
    pub async fn get_test(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        id: Uuid,
    ) -> Result<Test, AppError> {
        let test = Self::fetch_test(db, id).await?;
        if can_manage_owned(caller_role, test.professor_id == caller_id) {
            return Ok(test);
        }

        let visible: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM test_per_class tpc
                 JOIN class_students cs ON cs.class_id = tpc.class_id
                 WHERE tpc.test_id = $1 AND tpc.visible AND cs.student_id = $2
             )",
        )
        .bind(id)
        .bind(caller_id)
        .fetch_one(db)
        .await?;

        if !visible {
            return Err(AppError::forbidden("You cannot view this test"));
        }
        Ok(test)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_test(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        id: Uuid,
        dto: UpdateTestDto,
    ) -> Result<Test, AppError> {
        let test = Self::fetch_test(db, id).await?;
        if !can_manage_owned(caller_role, test.professor_id == caller_id) {
            return Err(AppError::forbidden("Only the owner of the test can update it"));
        }

        let title = dto
            .title
            .map(|v| v.trim().to_string())
            .unwrap_or(test.title);
        let color = dto.color.unwrap_or(test.color);
        let content = dto.content.map(Json).unwrap_or(test.content);
        let time_limit_minutes = dto.time_limit_minutes.unwrap_or(test.time_limit_minutes);
        let active = dto.active.unwrap_or(test.active);

        let test = sqlx::query_as::<_, Test>(
            "UPDATE tests
             SET title = $1, color = $2, content = $3, time_limit_minutes = $4, active = $5,
                 modified_at = NOW()
             WHERE id = $6
             RETURNING *",
        )
        .bind(&title)
        .bind(&color)
        .bind(&content)
        .bind(time_limit_minutes)
        .bind(active)
        .bind(id)
        .fetch_one(db)
        .await?;

        Ok(test)
    }

    #[instrument(skip(db))]
    pub async fn delete_test(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        id: Uuid,
    ) -> Result<(), AppError> {
        let test = Self::fetch_test(db, id).await?;
        if !can_manage_owned(caller_role, test.professor_id == caller_id) {
            return Err(AppError::forbidden("Only the owner of the test can delete it"));
        }

        sqlx::query("DELETE FROM tests WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        info!(test_id = %id, "Test deleted");
        Ok(())
    }

    /// Admins, or the owner of the test when they also teach the class.
    async fn authorize_assignment(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        test_id: Uuid,
        class_id: &str,
    ) -> Result<(), AppError> {
        let test = Self::fetch_test(db, test_id).await?;
        let access = class_access(db, class_id, caller_id).await?;
        if !can_assign_to_class(caller_role, test.professor_id == caller_id, access) {
            return Err(AppError::forbidden(
                "Only the owner of the test who teaches the class can do this",
            ));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn assign_to_class(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        test_id: Uuid,
        dto: AssignTestDto,
    ) -> Result<ClassTest, AppError> {
        Self::authorize_assignment(db, caller_id, caller_role, test_id, &dto.class_id).await?;

        let assignment = sqlx::query_as::<_, ClassTest>(
            "INSERT INTO test_per_class (test_id, class_id, visible) VALUES ($1, $2, $3)
             RETURNING test_id, class_id, visible, created_at",
        )
        .bind(test_id)
        .bind(&dto.class_id)
        .bind(dto.visible)
        .fetch_one(db)
        .await
        .map_err(|e| map_insert_error(e, "Test is already assigned to this class", "Class not found"))?;

        info!(test_id = %test_id, class_id = %dto.class_id, "Test assigned to class");
        Ok(assignment)
    }

    #[instrument(skip(db))]
    pub async fn set_visibility(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        test_id: Uuid,
        class_id: &str,
        visible: bool,
    ) -> Result<ClassTest, AppError> {
        Self::authorize_assignment(db, caller_id, caller_role, test_id, class_id).await?;

        sqlx::query_as::<_, ClassTest>(
            "UPDATE test_per_class SET visible = $1 WHERE test_id = $2 AND class_id = $3
             RETURNING test_id, class_id, visible, created_at",
        )
        .bind(visible)
        .bind(test_id)
        .bind(class_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Test is not assigned to this class")))
    }

    /// Removing the assignment also removes the answers given in that class.
    #[instrument(skip(db))]
    pub async fn remove_from_class(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        test_id: Uuid,
        class_id: &str,
    ) -> Result<(), AppError> {
        Self::authorize_assignment(db, caller_id, caller_role, test_id, class_id).await?;

        let result = sqlx::query("DELETE FROM test_per_class WHERE test_id = $1 AND class_id = $2")
            .bind(test_id)
            .bind(class_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Test is not assigned to this class")));
        }

        info!(test_id = %test_id, class_id = %class_id, "Test removed from class");
        Ok(())
    }

    /// Tests of a class. Students only get the visible ones.
    #[instrument(skip(db))]
    pub async fn list_class_tests(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        class_id: &str,
        pagination: PaginationParams,
    ) -> Result<Paginated<TestInClass>, AppError> {
        let access = class_access(db, class_id, caller_id).await?;
        if !can_view_class(caller_role, access) {
            return Err(AppError::forbidden("You are not a member of this class"));
        }

        let mut filters = Filters::new();
        filters.where_bound("tpc.class_id = ", class_id, "");
        if !can_moderate_class(caller_role, access) {
            filters.where_fixed("tpc.visible");
        }

        let page = fetch_page::<TestInClass>(
            db,
            "SELECT t.*, tpc.visible FROM tests t JOIN test_per_class tpc ON tpc.test_id = t.id",
            "SELECT COUNT(*) FROM tests t JOIN test_per_class tpc ON tpc.test_id = t.id",
            &filters,
            "tpc.created_at DESC, t.id",
            &pagination,
        )
        .await?;

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::classes::service::ClassService;
    use axum::http::StatusCode;
    use eduzas_models::Email;
    use eduzas_models::classes::CreateClassDto;
    use eduzas_models::users::{CreateUserDto, User};
    use serde_json::json;

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

    fn test_dto(title: &str) -> CreateTestDto {
        CreateTestDto {
            title: title.to_string(),
            color: None,
            content: json!({"questions": [{"q": "2 + 2", "options": [3, 4]}]}),
            time_limit_minutes: Some(30),
            professor_id: None,
        }
    }

    async fn class_of(pool: &PgPool, prof: &User) -> String {
        ClassService::create_class(
            pool,
            prof.id,
            Role::Professor,
            CreateClassDto {
                class_name: "Geometry".to_string(),
                subject: None,
                section: None,
                color: None,
                owner_id: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_students_only_see_visible_tests(pool: PgPool) {
        let prof = user(&pool, "prof@example.com", Role::Professor).await;
        let student = user(&pool, "student@example.com", Role::Student).await;
        let class_id = class_of(&pool, &prof).await;
        ClassService::enroll_student(&pool, student.id, Role::Student, &class_id, Default::default())
            .await
            .unwrap();

        let shown = TestService::create_test(&pool, prof.id, Role::Professor, test_dto("Shown"))
            .await
            .unwrap();
        let hidden = TestService::create_test(&pool, prof.id, Role::Professor, test_dto("Hidden"))
            .await
            .unwrap();
        for (test, visible) in [(&shown, true), (&hidden, false)] {
            TestService::assign_to_class(
                &pool,
                prof.id,
                Role::Professor,
                test.id,
                AssignTestDto {
                    class_id: class_id.clone(),
                    visible,
                },
            )
            .await
            .unwrap();
        }

        let criteria: TestCriteria = serde_json::from_value(json!({})).unwrap();
        let page = TestService::search_tests(&pool, student.id, Role::Student, criteria.clone())
            .await
            .unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.data[0].id, shown.id);

        let page = TestService::search_tests(&pool, prof.id, Role::Professor, criteria)
            .await
            .unwrap();
        assert_eq!(page.meta.total, 2);

        let err = TestService::get_test(&pool, student.id, Role::Student, hidden.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let listed = TestService::list_class_tests(&pool, student.id, Role::Student, &class_id, Default::default())
            .await
            .unwrap();
        assert_eq!(listed.meta.total, 1);
        let listed = TestService::list_class_tests(&pool, prof.id, Role::Professor, &class_id, Default::default())
            .await
            .unwrap();
        assert_eq!(listed.meta.total, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_student_class_filter_requires_enrollment(pool: PgPool) {
        let prof = user(&pool, "prof@example.com", Role::Professor).await;
        let student = user(&pool, "student@example.com", Role::Student).await;
        let enrolled_class = class_of(&pool, &prof).await;
        let other_class = class_of(&pool, &prof).await;
        ClassService::enroll_student(&pool, student.id, Role::Student, &enrolled_class, Default::default())
            .await
            .unwrap();

        let test = TestService::create_test(&pool, prof.id, Role::Professor, test_dto("Shared"))
            .await
            .unwrap();
        for class_id in [&enrolled_class, &other_class] {
            TestService::assign_to_class(
                &pool,
                prof.id,
                Role::Professor,
                test.id,
                AssignTestDto {
                    class_id: class_id.clone(),
                    visible: true,
                },
            )
            .await
            .unwrap();
        }

        let criteria: TestCriteria =
            serde_json::from_value(json!({ "class_id": other_class })).unwrap();
        let page = TestService::search_tests(&pool, student.id, Role::Student, criteria)
            .await
            .unwrap();
        assert_eq!(page.meta.total, 0);

        let criteria: TestCriteria =
            serde_json::from_value(json!({ "class_id": enrolled_class })).unwrap();
        let page = TestService::search_tests(&pool, student.id, Role::Student, criteria)
            .await
            .unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.data[0].id, test.id);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_only_owner_who_teaches_can_assign(pool: PgPool) {
        let owner = user(&pool, "owner@example.com", Role::Professor).await;
        let other = user(&pool, "other@example.com", Role::Professor).await;
        let class_id = class_of(&pool, &owner).await;
        let foreign_class = class_of(&pool, &other).await;

        let test = TestService::create_test(&pool, owner.id, Role::Professor, test_dto("Quiz"))
            .await
            .unwrap();

        let err = TestService::assign_to_class(
            &pool,
            owner.id,
            Role::Professor,
            test.id,
            AssignTestDto {
                class_id: foreign_class,
                visible: true,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let dto = AssignTestDto {
            class_id: class_id.clone(),
            visible: true,
        };
        TestService::assign_to_class(&pool, owner.id, Role::Professor, test.id, dto.clone())
            .await
            .unwrap();
        let err = TestService::assign_to_class(&pool, owner.id, Role::Professor, test.id, dto)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let updated = TestService::set_visibility(&pool, owner.id, Role::Professor, test.id, &class_id, false)
            .await
            .unwrap();
        assert!(!updated.visible);

        TestService::remove_from_class(&pool, owner.id, Role::Professor, test.id, &class_id)
            .await
            .unwrap();
        let err = TestService::remove_from_class(&pool, owner.id, Role::Professor, test.id, &class_id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_update_clears_time_limit(pool: PgPool) {
        let prof = user(&pool, "prof@example.com", Role::Professor).await;
        let other = user(&pool, "other@example.com", Role::Professor).await;
        let test = TestService::create_test(&pool, prof.id, Role::Professor, test_dto("Timed"))
            .await
            .unwrap();
        assert_eq!(test.time_limit_minutes, Some(30));

        let dto: UpdateTestDto = serde_json::from_value(json!({"time_limit_minutes": null})).unwrap();
        let err = TestService::update_test(&pool, other.id, Role::Professor, test.id, dto.clone())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let updated = TestService::update_test(&pool, prof.id, Role::Professor, test.id, dto)
            .await
            .unwrap();
        assert_eq!(updated.time_limit_minutes, None);
        assert_eq!(updated.title, "Timed");
    }
}
