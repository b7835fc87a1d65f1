//! Request extractors and middleware.
//!
//! - [`auth`]: `AuthUser` bearer-token extractor and role-gated extractors
//!   (`RequireAdmin`, `RequireContentCreator`, `RequireStudent`)
//! - [`rate_limit`]: per-client rate limiting for `/api` routes
//!
//! Fine-grained decisions (ownership, class membership) are made in the
//! services through `eduzas_auth::policy`; the role extractors only cover
//! endpoints that are closed to whole roles.

pub mod auth;
pub mod rate_limit;
