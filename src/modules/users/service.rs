use anyhow::anyhow;
use eduzas_auth::Role;
use eduzas_auth::policy::can_view_user;
use eduzas_core::{AppError, Paginated, hash_password, verify_password};
use eduzas_db::{Filters, fetch_page};
use eduzas_models::users::{
    ChangePasswordDto, CreateUserDto, USER_COLUMNS, USER_FIELDS, UpdateProfileDto, UpdateUserDto,
    User, UserCriteria,
};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::metrics::track_user_registered;
use crate::utils::db::conflict_on_unique;

pub struct UserService;

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Names after applying a profile patch to `user`.
struct Names {
    first_name: String,
    mid_name: Option<String>,
    father_lastname: String,
    mother_lastname: Option<String>,
}

impl Names {
    fn patched(user: &User, dto: UpdateProfileDto) -> Self {
        Self {
            first_name: dto
                .first_name
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| user.first_name.clone()),
            mid_name: match dto.mid_name {
                Some(value) => trimmed(value),
                None => user.mid_name.clone(),
            },
            father_lastname: dto
                .father_lastname
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| user.father_lastname.clone()),
            mother_lastname: match dto.mother_lastname {
                Some(value) => trimmed(value),
                None => user.mother_lastname.clone(),
            },
        }
    }
}

impl UserService {
    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_FIELDS))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    /// Fails with 404 when the user is missing and 400 when their role differs.
    #[instrument(skip(db))]
    pub async fn ensure_role(db: &PgPool, id: Uuid, expected: Role) -> Result<(), AppError> {
        let role: Role = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        if role != expected {
            return Err(AppError::bad_request(anyhow!(
                "User must have role {} but has role {}",
                expected,
                role
            )));
        }
        Ok(())
    }

    /// Reads a user on behalf of `caller_id`: the user themself, professors
    /// and admins.
    #[instrument(skip(db))]
    pub async fn get_user_for(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        id: Uuid,
    ) -> Result<User, AppError> {
        if !can_view_user(caller_role, caller_id == id) {
            return Err(AppError::forbidden("You cannot view this user"));
        }
        Self::get_user(db, id).await
    }

    #[instrument(skip(db, dto), fields(email = %dto.email, role = %dto.role))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        let hashed = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password, first_name, mid_name, father_lastname, mother_lastname, role)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            USER_FIELDS
        ))
        .bind(&dto.email)
        .bind(&hashed)
        .bind(dto.first_name.trim())
        .bind(trimmed(dto.mid_name))
        .bind(dto.father_lastname.trim())
        .bind(trimmed(dto.mother_lastname))
        .bind(dto.role)
        .fetch_one(db)
        .await
        .map_err(|e| conflict_on_unique(e, "A user with this email already exists"))?;

        track_user_registered(user.role.as_str());
        info!(user_id = %user.id, "User created by admin");
        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn search_users(
        db: &PgPool,
        criteria: UserCriteria,
    ) -> Result<Paginated<User>, AppError> {
        let mut filters = Filters::new();
        filters
            .where_string_query("u.email", criteria.email.as_ref())
            .where_string_query("u.first_name", criteria.first_name.as_ref())
            .where_string_query("u.father_lastname", criteria.father_lastname.as_ref())
            .where_optional("u.role", criteria.role.map(|r| r.as_str()))
            .where_optional("u.active", criteria.active);

        let page = fetch_page::<User>(
            db,
            &format!("SELECT {} FROM users u", USER_COLUMNS),
            "SELECT COUNT(*) FROM users u",
            &filters,
            "u.created_at DESC, u.id",
            &criteria.pagination,
        )
        .await?;

        Ok(page)
    }

    #[instrument(skip(db))]
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        dto: UpdateProfileDto,
    ) -> Result<User, AppError> {
        let user = Self::get_user(db, id).await?;
        let names = Names::patched(&user, dto);

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET first_name = $1, mid_name = $2, father_lastname = $3, mother_lastname = $4,
                 modified_at = NOW()
             WHERE id = $5
             RETURNING {}",
            USER_FIELDS
        ))
        .bind(&names.first_name)
        .bind(&names.mid_name)
        .bind(&names.father_lastname)
        .bind(&names.mother_lastname)
        .bind(id)
        .fetch_one(db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        id: Uuid,
        dto: ChangePasswordDto,
    ) -> Result<(), AppError> {
        let current: String = sqlx::query_scalar("SELECT password FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        if !verify_password(&dto.current_password, &current)? {
            return Err(AppError::bad_request(anyhow!("Current password is incorrect")));
        }

        let hashed = hash_password(&dto.new_password)?;
        sqlx::query("UPDATE users SET password = $1, modified_at = NOW() WHERE id = $2")
            .bind(&hashed)
            .bind(id)
            .execute(db)
            .await?;

        info!(user_id = %id, "Password changed");
        Ok(())
    }

    /// Admin update. Admins cannot demote or deactivate themselves.
    #[instrument(skip(db))]
    pub async fn update_user(
        db: &PgPool,
        caller_id: Uuid,
        id: Uuid,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let user = Self::get_user(db, id).await?;

        if caller_id == id {
            if dto.role.is_some_and(|role| role != user.role) {
                return Err(AppError::bad_request(anyhow!("You cannot change your own role")));
            }
            if dto.active == Some(false) {
                return Err(AppError::bad_request(anyhow!("You cannot deactivate yourself")));
            }
        }

        let role = dto.role.unwrap_or(user.role);
        let active = dto.active.unwrap_or(user.active);
        let names = Names::patched(&user, dto.profile);

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET first_name = $1, mid_name = $2, father_lastname = $3, mother_lastname = $4,
                 role = $5, active = $6, modified_at = NOW()
             WHERE id = $7
             RETURNING {}",
            USER_FIELDS
        ))
        .bind(&names.first_name)
        .bind(&names.mid_name)
        .bind(&names.father_lastname)
        .bind(&names.mother_lastname)
        .bind(role)
        .bind(active)
        .bind(id)
        .fetch_one(db)
        .await?;

        info!(user_id = %id, role = %role, active, "User updated by admin");
        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn delete_user(db: &PgPool, caller_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if caller_id == id {
            return Err(AppError::bad_request(anyhow!("You cannot delete yourself")));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("User not found")));
        }

        info!(user_id = %id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use eduzas_core::StringQuery;
    use eduzas_models::Email;

    fn create_dto(email: &str, role: Role) -> CreateUserDto {
        CreateUserDto {
            email: Email::new(email).unwrap(),
            password: "password123".to_string(),
            first_name: "Test".to_string(),
            mid_name: None,
            father_lastname: "User".to_string(),
            mother_lastname: None,
            role,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_create_and_search_users(pool: PgPool) {
        UserService::create_user(&pool, create_dto("prof.one@example.com", Role::Professor))
            .await
            .unwrap();
        UserService::create_user(&pool, create_dto("student.one@example.com", Role::Student))
            .await
            .unwrap();
        UserService::create_user(&pool, create_dto("student.two@example.com", Role::Student))
            .await
            .unwrap();

        let page = UserService::search_users(
            &pool,
            serde_json::from_value(serde_json::json!({
                "email": {"text": "student", "search_type": "LIKE"},
                "limit": 1
            }))
            .unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(page.meta.total, 2);
        assert_eq!(page.data.len(), 1);
        assert!(page.meta.has_more);

        let page = UserService::search_users(
            &pool,
            UserCriteria {
                email: Some(StringQuery::equals("prof.one@example.com")),
                first_name: None,
                father_lastname: None,
                role: Some(Role::Professor),
                active: None,
                pagination: Default::default(),
            },
        )
        .await
        .unwrap();
        assert_eq!(page.meta.total, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_admin_cannot_demote_or_delete_self(pool: PgPool) {
        let admin = UserService::create_user(&pool, create_dto("admin@example.com", Role::Admin))
            .await
            .unwrap();

        let err = UserService::update_user(
            &pool,
            admin.id,
            admin.id,
            UpdateUserDto {
                role: Some(Role::Student),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = UserService::delete_user(&pool, admin.id, admin.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_update_profile_clears_mid_name(pool: PgPool) {
        let mut dto = create_dto("profile@example.com", Role::Student);
        dto.mid_name = Some("María".to_string());
        let user = UserService::create_user(&pool, dto).await.unwrap();

        let updated = UserService::update_profile(
            &pool,
            user.id,
            UpdateProfileDto {
                mid_name: Some(None),
                first_name: Some("  Eva ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.first_name, "Eva");
        assert_eq!(updated.mid_name, None);
        assert_eq!(updated.father_lastname, "User");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_student_cannot_view_other_user(pool: PgPool) {
        let a = UserService::create_user(&pool, create_dto("a@example.com", Role::Student))
            .await
            .unwrap();
        let b = UserService::create_user(&pool, create_dto("b@example.com", Role::Student))
            .await
            .unwrap();

        let err = UserService::get_user_for(&pool, a.id, Role::Student, b.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(
            UserService::get_user_for(&pool, a.id, Role::Professor, b.id)
                .await
                .is_ok()
        );
    }
}
