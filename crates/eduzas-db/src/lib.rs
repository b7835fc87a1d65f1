//! # EduZas DB
//!
//! Pool initialisation, embedded migrations and [`filter`], the generic
//! filter and paginated query builder every search endpoint uses.
//!
//! # Example
//!
//! ```ignore
//! use eduzas_db::{init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&database_url, 10).await?;
//! run_migrations(&pool).await?;
//! ```

pub mod filter;

use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub use filter::{FilterValue, Filters, escape_like, fetch_page};
pub use sqlx::PgPool;

/// Connects a PostgreSQL pool.
///
/// # Errors
///
/// Fails when the URL is invalid or the database cannot be reached.
pub async fn init_db_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(database_url)
        .await?;

    info!(max_connections, "Database pool initialized");
    Ok(pool)
}

/// Applies the migrations under `migrations/` that have not run yet.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
