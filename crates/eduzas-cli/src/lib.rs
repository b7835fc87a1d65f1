//! # EduZas CLI
//!
//! Administrative commands that have no HTTP counterpart: bootstrapping the
//! first admin account and filling a development database with fake data.
//!
//! ```ignore
//! use eduzas_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new(5, 100).with_classes(10, 20);
//! seed_all(&pool, config).await?;
//! ```

pub mod admin;
pub mod seeder;
