//! Feature modules. Each one carries a `controller`, a `service` and a
//! `router`; entities and DTOs live in `eduzas_models`.

pub mod answers;
pub mod auth;
pub mod classes;
pub mod contacts;
pub mod notifications;
pub mod resources;
pub mod tags;
pub mod tests;
pub mod users;
