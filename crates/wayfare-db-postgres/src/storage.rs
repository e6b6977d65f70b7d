//! PostgreSQL implementation of the CountryStore trait.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sqlx_postgres::PgPool;
use tracing::{info, warn};

use wayfare_storage::{Country, CountryField, CountryStore, OrderBy, Predicate, StoreError, Window};

use crate::config::PostgresConfig;
use crate::error::PostgresError;
use crate::pool::{self, mask_password};
use crate::queries::countries;
use crate::schema;

/// PostgreSQL country store.
///
/// The connectivity flag is decided once, when the store is opened: if the
/// database cannot be reached the store keeps a lazy pool and reports itself
/// disconnected so callers can switch to offline data.
#[derive(Debug, Clone)]
pub struct PostgresCountryStore {
    pool: PgPool,
    connected: Arc<AtomicBool>,
}

impl PostgresCountryStore {
    /// Opens the store.
    ///
    /// This will:
    /// 1. Try to create a connection pool
    /// 2. Create the schema (if configured)
    /// 3. Fall back to a lazy, disconnected pool if either step fails
    ///
    /// # Errors
    ///
    /// Returns an error only when the connection URL itself is malformed.
    pub async fn open(config: &PostgresConfig) -> Result<Self, PostgresError> {
        match Self::connect(config).await {
            Ok(pool) => {
                info!(url = %mask_password(&config.url), "Connected to PostgreSQL");
                Ok(Self::from_pool(pool, true))
            }
            Err(e) => {
                warn!(
                    url = %mask_password(&config.url),
                    error = %e,
                    "PostgreSQL unreachable; country store starts disconnected"
                );
                let pool = pool::create_lazy_pool(config)?;
                Ok(Self::from_pool(pool, false))
            }
        }
    }

    async fn connect(config: &PostgresConfig) -> Result<PgPool, PostgresError> {
        let pool = pool::create_pool(config).await?;
        pool::test_connection(&pool).await?;
        if config.run_migrations {
            schema::ensure_schema(&pool).await?;
        }
        Ok(pool)
    }

    /// Creates a store from an existing pool with a known connectivity state.
    ///
    /// The schema is not created when using this constructor.
    #[must_use]
    pub fn from_pool(pool: PgPool, connected: bool) -> Self {
        Self {
            pool,
            connected: Arc::new(AtomicBool::new(connected)),
        }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CountryStore for PostgresCountryStore {
    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        countries::count(&self.pool, predicate).await
    }

    async fn find_many(
        &self,
        predicate: &Predicate,
        order: OrderBy,
        window: Window,
    ) -> Result<Vec<Country>, StoreError> {
        countries::find_many(&self.pool, predicate, order, window).await
    }

    async fn find_first(&self, predicate: &Predicate) -> Result<Option<Country>, StoreError> {
        countries::find_first(&self.pool, predicate).await
    }

    async fn group_by_count(&self, field: CountryField) -> Result<Vec<(String, u64)>, StoreError> {
        countries::group_by_count(&self.pool, field).await
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
