//! Cache layer errors.

use thiserror::Error;

/// Errors raised by a cache backend or while encoding cached values.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing cache (Redis) could not be reached or rejected a command.
    #[error("Cache backend error: {message}")]
    Backend { message: String },

    /// A value could not be encoded to or decoded from its cached form.
    #[error("Cache serialization error: {message}")]
    Serialization { message: String },
}

impl CacheError {
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::backend(err.to_string())
    }
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::backend(format!("Failed to get Redis connection: {err}"))
    }
}

impl From<rmp_serde::encode::Error> for CacheError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for CacheError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        assert_eq!(
            CacheError::backend("connection refused").to_string(),
            "Cache backend error: connection refused"
        );
        assert_eq!(
            CacheError::serialization("bad marker").to_string(),
            "Cache serialization error: bad marker"
        );
    }

    #[test]
    fn decode_errors_map_to_serialization() {
        let err: CacheError = rmp_serde::from_slice::<String>(&[0xc1])
            .unwrap_err()
            .into();
        assert!(matches!(err, CacheError::Serialization { .. }));
    }
}
