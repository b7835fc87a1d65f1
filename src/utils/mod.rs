//! Shared application utilities.
//!
//! - [`db`]: mapping of constraint violations to HTTP errors
//! - [`email`]: transactional mail over SMTP

pub mod db;
pub mod email;
