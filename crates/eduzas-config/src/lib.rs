//! # EduZas Config
//!
//! Configuration structures loaded from environment variables. Every value
//! has a default so a bare development environment starts without a `.env`.
//!
//! - [`jwt`]: JWT signing secret and token lifetimes
//! - [`cors`]: allowed CORS origins
//! - [`email`]: SMTP settings
//! - [`rate_limit`]: per-client request quotas
//! - [`server`]: listener addresses, pool size and log directory
//!
//! # Example
//!
//! ```ignore
//! use eduzas_config::{JwtConfig, CorsConfig, EmailConfig, RateLimitConfig, ServerConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let server = ServerConfig::from_env();
//! println!("listening on {}", server.address());
//! ```

pub mod cors;
pub mod email;
pub mod jwt;
pub mod rate_limit;
pub mod server;

pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;

pub(crate) fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| {
            let v = v.trim().to_lowercase();
            v == "true" || v == "1"
        })
        .unwrap_or(default)
}
