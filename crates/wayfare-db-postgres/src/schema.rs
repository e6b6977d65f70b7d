//! Schema management for the PostgreSQL country store.
//!
//! A single `countries` table holds the reference data. Lookup-heavy columns
//! get expression indexes on `lower(...)` because every comparison the store
//! issues is case-insensitive.

use sqlx_postgres::PgPool;
use tracing::{info, instrument};

use crate::error::{PostgresError, Result};

/// Name of the table backing the store.
pub const COUNTRIES_TABLE: &str = "countries";

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS countries (
    code           TEXT PRIMARY KEY,
    code3          TEXT NOT NULL UNIQUE,
    name           TEXT NOT NULL,
    official_name  TEXT NOT NULL DEFAULT '',
    capital        TEXT NOT NULL DEFAULT '',
    continent      TEXT NOT NULL,
    region         TEXT NOT NULL DEFAULT '',
    languages      TEXT[] NOT NULL DEFAULT '{}',
    currencies     TEXT[] NOT NULL DEFAULT '{}',
    calling_codes  TEXT[] NOT NULL DEFAULT '{}',
    is_popular     BOOLEAN NOT NULL DEFAULT FALSE,
    flag           TEXT NOT NULL DEFAULT '',
    latitude       DOUBLE PRECISION NOT NULL DEFAULT 0,
    longitude      DOUBLE PRECISION NOT NULL DEFAULT 0
)
"#;

const CREATE_INDEXES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS countries_code_lower_idx ON countries (lower(code))",
    "CREATE INDEX IF NOT EXISTS countries_code3_lower_idx ON countries (lower(code3))",
    "CREATE INDEX IF NOT EXISTS countries_continent_lower_idx ON countries (lower(continent))",
    "CREATE INDEX IF NOT EXISTS countries_name_idx ON countries (name)",
];

/// Creates the `countries` table and its indexes if they do not exist.
///
/// Idempotent; safe to run on every startup.
#[instrument(skip(pool))]
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx_core::query::query(CREATE_TABLE)
        .execute(pool)
        .await
        .map_err(|e| PostgresError::Migration(format!("create table: {e}")))?;

    for statement in CREATE_INDEXES {
        sqlx_core::query::query(statement)
            .execute(pool)
            .await
            .map_err(|e| PostgresError::Migration(format!("create index: {e}")))?;
    }

    info!(table = COUNTRIES_TABLE, "Country schema ready");
    Ok(())
}
