use std::sync::Arc;

use eduzas_config::{CorsConfig, EmailConfig, JwtConfig, RateLimitConfig};
use sqlx::PgPool;

use crate::middleware::rate_limit::RateLimiters;
use crate::utils::email::EmailService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub email: EmailService,
    pub rate_limiters: Arc<RateLimiters>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        jwt_config: JwtConfig,
        email_config: EmailConfig,
        cors_config: CorsConfig,
        rate_limit_config: RateLimitConfig,
    ) -> Self {
        Self {
            db,
            email: EmailService::new(email_config.clone()),
            rate_limiters: Arc::new(RateLimiters::new(&rate_limit_config)),
            jwt_config,
            email_config,
            cors_config,
            rate_limit_config,
        }
    }

    /// State with every config read from the environment.
    pub fn from_env(db: PgPool) -> Self {
        Self::new(
            db,
            JwtConfig::from_env(),
            EmailConfig::from_env(),
            CorsConfig::from_env(),
            RateLimitConfig::from_env(),
        )
    }
}
