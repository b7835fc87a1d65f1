//! # EduZas Models
//!
//! Entities, request DTOs and search criteria for every EduZas feature.
//!
//! Entities derive `sqlx::FromRow` and `utoipa::ToSchema`; request DTOs derive
//! `validator::Validate`; search criteria flatten
//! [`eduzas_core::PaginationParams`] so `limit`, `offset` and `page` sit next
//! to the filters in the request body.

pub mod answers;
pub mod auth;
pub mod classes;
pub mod contacts;
pub mod notifications;
pub mod resources;
pub mod tags;
pub mod tests;
pub mod users;
pub mod value_types;

pub use value_types::{Email, HexColor, ValueTypeError};
