use std::env;

use crate::env_parse;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime in seconds.
    pub access_token_expiry: i64,
    /// Password reset token lifetime in seconds.
    pub password_reset_expiry: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "your-secret-key-change-in-production".to_string(),
            access_token_expiry: 3600,
            password_reset_expiry: 3600,
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            secret: env::var("JWT_SECRET").unwrap_or(defaults.secret),
            access_token_expiry: env_parse("JWT_ACCESS_EXPIRY", defaults.access_token_expiry),
            password_reset_expiry: env_parse(
                "PASSWORD_RESET_EXPIRY",
                defaults.password_reset_expiry,
            ),
        }
    }
}
