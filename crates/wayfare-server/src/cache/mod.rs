//! Two-tier caching for the country read path.
//!
//! ## Architecture
//!
//! - **L1 Cache (DashMap)**: In-memory, per-instance
//! - **L2 Cache (Redis)**: Network, shared across instances
//!
//! ## Cache Hierarchy
//!
//! ```text
//! GET request → L1 (DashMap) → L2 (Redis) → Source (store)
//! ```
//!
//! ## Graceful Degradation
//!
//! If Redis is disabled or unreachable at startup, the server runs in L1-only
//! mode (local cache per instance).

pub mod backend;
mod error;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use backend::{CacheBackend, CacheStats, CachedEntry};
pub use error::CacheError;

/// Key → bytes store with per-key expiry.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the stored bytes, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Arc<Vec<u8>>>, CacheError>;

    /// Stores `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Short label for health output (`local`, `redis`).
    fn mode(&self) -> &'static str;
}

/// Type alias for a shared cache handle.
pub type DynCache = Arc<dyn Cache>;

/// Encodes a value as named-field MessagePack.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CacheError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Decodes a value previously written by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CacheError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Summary {
        name: String,
        country_count: u64,
    }

    #[test]
    fn named_encoding_survives_decode() {
        let value = vec![Summary {
            name: "Europe".into(),
            country_count: 4,
        }];
        let bytes = encode(&value).unwrap();
        let back: Vec<Summary> = decode(&bytes).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn decoding_garbage_is_a_serialization_error() {
        let err = decode::<Vec<Summary>>(b"\xc1").unwrap_err();
        assert!(matches!(err, CacheError::Serialization { .. }));
    }
}
