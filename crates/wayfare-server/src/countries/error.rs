//! Country lookup errors.

use thiserror::Error;
use wayfare_api::ApiError;
use wayfare_storage::StoreError;

use crate::cache::CacheError;

/// Errors returned by [`super::CountryService`].
///
/// A disconnected store is not an error: it switches the service onto the
/// offline dataset.
#[derive(Debug, Error)]
pub enum CountryError {
    /// No record matches the requested code.
    #[error("Country with code {code} not found")]
    NotFound { code: String },

    /// The request parameters are out of range.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The store failed while serving a cache miss.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The cache failed to read, write or decode an entry.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl CountryError {
    #[must_use]
    pub fn not_found(code: impl Into<String>) -> Self {
        Self::NotFound { code: code.into() }
    }

    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// True for failures of the store or cache rather than of the request.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Cache(_))
    }
}

impl From<CountryError> for ApiError {
    fn from(err: CountryError) -> Self {
        match err {
            CountryError::NotFound { .. } => ApiError::not_found(err.to_string()),
            CountryError::InvalidRequest { message } => ApiError::bad_request(message),
            CountryError::Store(e) if e.is_unavailable() => {
                ApiError::service_unavailable("Country data is temporarily unavailable")
            }
            CountryError::Store(_) | CountryError::Cache(_) => {
                ApiError::internal("Failed to load country data")
            }
        }
    }
}
