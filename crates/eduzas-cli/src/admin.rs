//! Admin bootstrap.

use eduzas_auth::Role;
use eduzas_core::hash_password;
use eduzas_models::Email;
use sqlx::PgPool;
use uuid::Uuid;

pub struct NewAdmin {
    pub first_name: String,
    pub father_lastname: String,
    pub email: String,
    pub password: String,
}

/// Inserts an `ADMIN` account. Fails when the email is taken.
pub async fn create_admin(db: &PgPool, admin: &NewAdmin) -> Result<Uuid, Box<dyn std::error::Error>> {
    let first_name = admin.first_name.trim();
    let father_lastname = admin.father_lastname.trim();
    if first_name.is_empty() || father_lastname.is_empty() {
        return Err("First name and father lastname are required".into());
    }
    let email = Email::new(admin.email.trim())?;
    if admin.password.len() < 8 {
        return Err("Password must be at least 8 characters".into());
    }

    let hashed_password = hash_password(&admin.password)
        .map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let user_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (first_name, father_lastname, email, password, role)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(first_name)
    .bind(father_lastname)
    .bind(&email)
    .bind(&hashed_password)
    .bind(Role::Admin)
    .fetch_optional(db)
    .await?;

    user_id.ok_or_else(|| "User with this email already exists".into())
}
