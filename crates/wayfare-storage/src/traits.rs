//! The store gateway trait implemented by every country backend.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{Country, CountryField, OrderBy, Predicate, Window};

/// Read access to the relational table of countries.
///
/// Implementations must be thread-safe (`Send + Sync`). Every query method
/// takes a [`Predicate`] so callers build filters once and reuse them for the
/// count and the page fetch.
///
/// # Example
///
/// ```ignore
/// use wayfare_storage::{CountryStore, CountryField, Predicate, StoreError};
///
/// async fn european_count(store: &dyn CountryStore) -> Result<u64, StoreError> {
///     store
///         .count(&Predicate::equals(CountryField::Continent, "Europe"))
///         .await
/// }
/// ```
#[async_trait]
pub trait CountryStore: Send + Sync {
    /// Counts records matching the predicate.
    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError>;

    /// Fetches matching records in the given order, restricted to a window.
    async fn find_many(
        &self,
        predicate: &Predicate,
        order: OrderBy,
        window: Window,
    ) -> Result<Vec<Country>, StoreError>;

    /// Fetches the first matching record, if any.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing records.
    async fn find_first(&self, predicate: &Predicate) -> Result<Option<Country>, StoreError>;

    /// Counts records per distinct value of `field`, ordered by value ascending.
    async fn group_by_count(&self, field: CountryField) -> Result<Vec<(String, u64)>, StoreError>;

    /// Current connectivity state. Read synchronously before every operation.
    fn is_connected(&self) -> bool;

    /// Human-readable backend name (for logging and readiness reports).
    fn backend_name(&self) -> &'static str;
}
