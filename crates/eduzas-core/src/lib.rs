//! # EduZas Core
//!
//! Core types, errors, and utilities shared by every EduZas crate.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Pagination parameters, metadata and paginated pages
//! - [`password`]: Password hashing and verification
//! - [`query`]: `StringQuery` text filters used by search criteria
//! - [`serde`]: Custom serde deserialization helpers
//!
//! # Example
//!
//! ```ignore
//! use eduzas_core::{AppError, PaginationParams, PaginationMeta};
//! use eduzas_core::password::{hash_password, verify_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Class not found"));
//!
//! let hash = hash_password("secure_password")?;
//!
//! let params = PaginationParams::default();
//! let meta = PaginationMeta::new(42, &params);
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod query;
pub mod serde;

pub use errors::AppError;
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
pub use query::{SearchType, StringQuery};
