use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use eduzas_auth::{Claims, Role, verify_token};
use eduzas_core::AppError;
use uuid::Uuid;

use crate::state::AppState;

/// Extractor that validates the bearer token and yields its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Uuid {
        self.0.sub
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn is_admin(&self) -> bool {
        self.0.role.is_admin()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))?;

        let claims = verify_token(token.trim(), &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Declares an extractor that authenticates the caller and requires one of
/// the listed roles, rejecting everyone else with 403.
#[macro_export]
macro_rules! require_role {
    ($name:ident, $($role:path)|+) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = eduzas_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;

                if !matches!(auth_user.role(), $($role)|+) {
                    return Err(eduzas_core::AppError::forbidden(format!(
                        "Access denied for role {}",
                        auth_user.role()
                    )));
                }

                Ok($name(auth_user))
            }
        }
    };
}

require_role!(RequireAdmin, Role::Admin);
require_role!(RequireContentCreator, Role::Professor | Role::Admin);
require_role!(RequireStudent, Role::Student);
