use anyhow::anyhow;
use chrono::{Duration, Utc};
use eduzas_auth::{Role, create_access_token};
use eduzas_config::JwtConfig;
use eduzas_core::{AppError, hash_password, verify_password};
use eduzas_models::auth::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest,
    UserCredentials,
};
use eduzas_models::users::{USER_FIELDS, User};
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::metrics::{track_login_failure, track_login_success, track_user_registered};
use crate::utils::db::conflict_on_unique;
use crate::utils::email::EmailService;

pub struct AuthService;

#[derive(Debug, FromRow)]
struct ResetTarget {
    id: Uuid,
    email: String,
    first_name: String,
}

#[derive(Debug, FromRow)]
struct PendingReset {
    token_id: Uuid,
    user_id: Uuid,
    email: String,
    first_name: String,
}

/// Returns the raw token to mail and the SHA-256 hex digest to store.
fn generate_reset_token() -> (String, String) {
    let bytes: [u8; 32] = rand::random();
    let token = hex::encode(bytes);
    let digest = hash_reset_token(&token);
    (token, digest)
}

fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.trim().as_bytes()))
}

impl AuthService {
    #[instrument(skip(db, email, dto), fields(email = %dto.email))]
    pub async fn register(
        db: &PgPool,
        email: &EmailService,
        dto: RegisterRequest,
    ) -> Result<User, AppError> {
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
        .bind(dto.mid_name.as_deref().map(str::trim))
        .bind(dto.father_lastname.trim())
        .bind(dto.mother_lastname.as_deref().map(str::trim))
        .bind(Role::Student)
        .fetch_one(db)
        .await
        .map_err(|e| conflict_on_unique(e, "A user with this email already exists"))?;

        track_user_registered(user.role.as_str());
        info!(user_id = %user.id, "User registered");

        let mailer = email.clone();
        let (to, name) = (user.email.to_string(), user.first_name.clone());
        tokio::spawn(async move {
            if let Err(e) = mailer.send_welcome_email(&to, &name).await {
                warn!(error = %e.error, "Failed to send welcome email");
            }
        });

        Ok(user)
    }

    #[instrument(skip(db, jwt_config, dto), fields(email = %dto.email))]
    pub async fn login(
        db: &PgPool,
        jwt_config: &JwtConfig,
        dto: LoginRequest,
    ) -> Result<LoginResponse, AppError> {
        let email = dto.email.trim().to_lowercase();

        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, password, role, active FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(db)
        .await?;

        let Some(credentials) = credentials else {
            track_login_failure("unknown_email");
            return Err(AppError::unauthorized("Invalid email or password"));
        };

        if !verify_password(&dto.password, &credentials.password)? {
            track_login_failure("wrong_password");
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        if !credentials.active {
            track_login_failure("inactive");
            return Err(AppError::forbidden("Account is deactivated"));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_FIELDS
        ))
        .bind(credentials.id)
        .fetch_one(db)
        .await?;

        let access_token =
            create_access_token(user.id, user.email.as_str(), user.role, jwt_config)?;

        track_login_success(user.role.as_str());
        info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
            user,
        })
    }

    /// Issues a reset token when an active account exists. Always succeeds
    /// otherwise so the response does not reveal which emails are registered.
    #[instrument(skip(db, email, jwt_config, dto))]
    pub async fn forgot_password(
        db: &PgPool,
        email: &EmailService,
        jwt_config: &JwtConfig,
        dto: ForgotPasswordRequest,
    ) -> Result<(), AppError> {
        let target = sqlx::query_as::<_, ResetTarget>(
            "SELECT id, email, first_name FROM users WHERE email = $1 AND active = TRUE",
        )
        .bind(dto.email.trim().to_lowercase())
        .fetch_optional(db)
        .await?;

        let Some(target) = target else {
            info!("Password reset requested for unknown or inactive account");
            return Ok(());
        };

        let (token, token_hash) = generate_reset_token();
        let expires_at = Utc::now() + Duration::seconds(jwt_config.password_reset_expiry);

        let mut tx = db.begin().await?;

        sqlx::query(
            "UPDATE password_reset_tokens SET used_at = NOW()
             WHERE user_id = $1 AND used_at IS NULL",
        )
        .bind(target.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
             VALUES ($1, $2, $3)",
        )
        .bind(target.id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(user_id = %target.id, "Password reset token issued");

        let mailer = email.clone();
        let expires_in_minutes = jwt_config.password_reset_expiry / 60;
        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_password_reset_email(
                    &target.email,
                    &target.first_name,
                    &token,
                    expires_in_minutes,
                )
                .await
            {
                warn!(error = %e.error, "Failed to send password reset email");
            }
        });

        Ok(())
    }

    #[instrument(skip(db, email, dto))]
    pub async fn reset_password(
        db: &PgPool,
        email: &EmailService,
        dto: ResetPasswordRequest,
    ) -> Result<(), AppError> {
        let token_hash = hash_reset_token(&dto.token);
        let hashed = hash_password(&dto.new_password)?;

        let mut tx = db.begin().await?;

        let pending = sqlx::query_as::<_, PendingReset>(
            "SELECT t.id AS token_id, t.user_id, u.email, u.first_name
             FROM password_reset_tokens t
             JOIN users u ON u.id = t.user_id
             WHERE t.token_hash = $1 AND t.used_at IS NULL AND t.expires_at > NOW()
             FOR UPDATE OF t",
        )
        .bind(&token_hash)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::bad_request(anyhow!("Invalid or expired reset token")))?;

        sqlx::query("UPDATE users SET password = $1, modified_at = NOW() WHERE id = $2")
            .bind(&hashed)
            .bind(pending.user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE password_reset_tokens SET used_at = NOW() WHERE id = $1")
            .bind(pending.token_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(user_id = %pending.user_id, "Password reset");

        let mailer = email.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_password_reset_confirmation(&pending.email, &pending.first_name)
                .await
            {
                warn!(error = %e.error, "Failed to send password reset confirmation");
            }
        });

        Ok(())
    }
}
