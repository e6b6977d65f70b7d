pub mod auth;
pub mod cache;
pub mod config;
pub mod countries;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod observability;
pub mod server;

use std::sync::Arc;

pub use cache::{Cache, CacheBackend, CachedEntry, DynCache};
pub use config::{AppConfig, StorageBackend};
pub use countries::{CountryError, CountryService};
pub use observability::init_tracing;
pub use server::{AppState, ServerBuilder, WayfareServer, build_app};

use config::RedisConfig;
use wayfare_db_memory::InMemoryCountryStore;
use wayfare_db_postgres::PostgresCountryStore;
use wayfare_storage::DynCountryStore;

/// Create a cache backend based on configuration.
///
/// ## Cache Modes
///
/// - **Redis disabled**: Returns local-only cache (DashMap)
/// - **Redis enabled**: Attempts to connect to Redis, falls back to local on failure
///
/// ## Graceful Degradation
///
/// If Redis connection fails, the system automatically falls back to local-only mode.
/// This allows the server to start and run even if Redis is unavailable.
pub async fn create_cache_backend(config: &RedisConfig) -> CacheBackend {
    use std::time::Duration;

    if !config.enabled {
        tracing::info!("Redis disabled, using local cache only");
        return CacheBackend::new_local();
    }

    tracing::info!(url = %config.url, "Connecting to Redis");

    let mut redis_config = deadpool_redis::Config::from_url(&config.url);
    let timeout = Some(Duration::from_millis(config.timeout_ms));
    let pool_config = redis_config
        .pool
        .get_or_insert_with(|| deadpool_redis::PoolConfig::new(config.pool_size));
    pool_config.max_size = config.pool_size;
    pool_config.timeouts.wait = timeout;
    pool_config.timeouts.create = timeout;
    pool_config.timeouts.recycle = timeout;

    let pool = match redis_config.create_pool(Some(deadpool_redis::Runtime::Tokio1)) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to create Redis pool. Falling back to local cache."
            );
            return CacheBackend::new_local();
        }
    };

    match pool.get().await {
        Ok(_) => {
            tracing::info!("Connected to Redis");
            CacheBackend::new_redis(pool)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to connect to Redis. Falling back to local cache."
            );
            CacheBackend::new_local()
        }
    }
}

/// Opens the configured country store.
///
/// The PostgreSQL store never fails on an unreachable database: it comes up
/// disconnected and the service answers from the offline dataset. Only a
/// malformed connection URL is an error.
pub async fn create_country_store(config: &AppConfig) -> anyhow::Result<DynCountryStore> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            let pg = config.storage.postgres.to_postgres_config();
            let store = PostgresCountryStore::open(&pg).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            let store = InMemoryCountryStore::with_countries(countries::fallback::countries());
            tracing::info!(countries = store.len(), "Using in-memory country store");
            Ok(Arc::new(store))
        }
    }
}
