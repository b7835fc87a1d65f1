use anyhow::anyhow;
use eduzas_core::AppError;

/// Maps a unique violation to 409 with `message`; anything else stays a 500.
pub fn conflict_on_unique(e: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::conflict(message);
    }
    AppError::from(e)
}

/// Maps a foreign-key violation to 404 with `message`.
pub fn not_found_on_foreign_key(e: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_foreign_key_violation()
    {
        return AppError::not_found(anyhow!(message.to_string()));
    }
    AppError::from(e)
}

/// Unique violations become 409 and foreign-key violations 404.
pub fn map_insert_error(e: sqlx::Error, conflict: &str, missing: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::conflict(conflict);
        }
        if db_err.is_foreign_key_violation() {
            return AppError::not_found(anyhow!(missing.to_string()));
        }
    }
    AppError::from(e)
}
