//! # EduZas Auth
//!
//! - [`role`]: the three account roles and their database/JSON codec
//! - [`claims`]: JWT access token claims
//! - [`jwt`]: token creation and verification
//! - [`policy`]: pure authorization decisions used by the services
//!
//! # Example
//!
//! ```ignore
//! use eduzas_auth::{Role, create_access_token, verify_token};
//! use eduzas_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "ana@example.com", Role::Professor, &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert_eq!(claims.role, Role::Professor);
//! ```

pub mod claims;
pub mod jwt;
pub mod policy;
pub mod role;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
pub use role::Role;
