//! Registration, login and password reset DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use eduzas_auth::Role;

use crate::users::User;
use crate::value_types::Email;

pub use eduzas_auth::Claims;

/// Self-service sign up. Accounts created this way are always students.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    pub email: Email,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    #[schema(example = "password123")]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "first_name must be 1-50 characters"))]
    pub first_name: String,
    #[validate(length(max = 50, message = "mid_name must be at most 50 characters"))]
    pub mid_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "father_lastname must be 1-50 characters"))]
    pub father_lastname: String,
    #[validate(length(max = 50, message = "mother_lastname must be at most 50 characters"))]
    pub mother_lastname: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Seconds until the access token expires.
    pub expires_in: i64,
    pub user: User,
}

/// Row used to check a login; the only place the password hash is read.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: Email,
    pub password: String,
    pub role: Role,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "email must be a valid email address"))]
    #[schema(example = "user@example.com")]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
    #[validate(length(min = 8, max = 128, message = "new_password must be 8-128 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let request: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "new@example.com",
            "password": "password123",
            "first_name": "Ana",
            "father_lastname": "Pérez"
        }))
        .unwrap();
        assert!(request.validate().is_ok());
        assert!(request.mid_name.is_none());
    }

    #[test]
    fn test_register_request_rejects_bad_email() {
        let result = serde_json::from_value::<RegisterRequest>(serde_json::json!({
            "email": "not-an-email",
            "password": "password123",
            "first_name": "Ana",
            "father_lastname": "Pérez"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_login_request_validation() {
        let request = LoginRequest {
            email: "bad".to_string(),
            password: String::new(),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_reset_password_requires_long_password() {
        let request = ResetPasswordRequest {
            token: "abc".to_string(),
            new_password: "short".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
