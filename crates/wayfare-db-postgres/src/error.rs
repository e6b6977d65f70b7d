//! Error types for the PostgreSQL country store.

use sqlx_core::error::Error as SqlxError;
use wayfare_storage::StoreError;

/// PostgreSQL error code for undefined table (42P01).
pub const PG_UNDEFINED_TABLE: &str = "42P01";

/// Checks if a sqlx error has a specific PostgreSQL error code.
pub fn has_pg_error_code(err: &SqlxError, code: &str) -> bool {
    if let SqlxError::Database(db_err) = err {
        db_err.code().as_deref() == Some(code)
    } else {
        false
    }
}

/// Checks if a sqlx error is "undefined table" (42P01).
pub fn is_undefined_table(err: &SqlxError) -> bool {
    has_pg_error_code(err, PG_UNDEFINED_TABLE)
}

/// Checks if a sqlx error means the database could not be reached.
pub fn is_connectivity_error(err: &SqlxError) -> bool {
    matches!(
        err,
        SqlxError::Io(_) | SqlxError::Tls(_) | SqlxError::PoolTimedOut | SqlxError::PoolClosed
    )
}

/// Errors specific to the PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(#[from] SqlxError),

    /// Schema bootstrap error.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<PostgresError> for StoreError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Connection(e) => StoreError::unavailable(e.to_string()),
            PostgresError::Migration(e) => StoreError::internal(format!("Migration error: {e}")),
            PostgresError::Config { message } => {
                StoreError::internal(format!("Configuration error: {message}"))
            }
        }
    }
}

/// Maps a failed query onto the store error taxonomy.
pub(crate) fn query_error(context: &str, err: SqlxError) -> StoreError {
    if is_connectivity_error(&err) {
        StoreError::unavailable(format!("{context}: {err}"))
    } else if is_undefined_table(&err) {
        StoreError::query(format!("{context}: countries table does not exist"))
    } else {
        StoreError::query(format!("{context}: {err}"))
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;
