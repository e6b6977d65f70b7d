use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;
use wayfare_storage::{
    Country, CountryField, CountryStore, OrderBy, Predicate, StoreError, Window,
};

/// In-memory country store using papaya lock-free HashMap.
///
/// This store provides:
/// - Lock-free concurrent reads via papaya::HashMap, keyed by alpha-2 code
/// - A settable connectivity flag so callers can exercise offline behavior
/// - A query counter for observing how often the backing store was hit
#[derive(Debug)]
pub struct InMemoryCountryStore {
    data: Arc<PapayaHashMap<String, Country>>,
    connected: AtomicBool,
    queries: AtomicU64,
}

impl InMemoryCountryStore {
    /// Creates an empty, connected store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(PapayaHashMap::new()),
            connected: AtomicBool::new(true),
            queries: AtomicU64::new(0),
        }
    }

    /// Creates a connected store seeded with the given countries.
    pub fn with_countries(countries: impl IntoIterator<Item = Country>) -> Self {
        let store = Self::new();
        for country in countries {
            store.insert(country);
        }
        store
    }

    /// Inserts or replaces a country, keyed by its uppercase alpha-2 code.
    pub fn insert(&self, country: Country) {
        self.data.pin().insert(country.code.to_uppercase(), country);
    }

    /// Number of stored countries.
    pub fn len(&self) -> usize {
        self.data.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flips the connectivity flag read by [`CountryStore::is_connected`].
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
        tracing::debug!(connected, "in-memory store connectivity changed");
    }

    /// Number of queries executed against this store so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    /// Guards a query: fails while offline, otherwise counts it.
    fn begin_query(&self) -> Result<(), StoreError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("in-memory store is offline"));
        }
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn matching(&self, predicate: &Predicate) -> Vec<Country> {
        self.data
            .pin()
            .iter()
            .filter(|(_, country)| predicate.matches(country))
            .map(|(_, country)| country.clone())
            .collect()
    }
}

impl Default for InMemoryCountryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CountryStore for InMemoryCountryStore {
    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        self.begin_query()?;
        Ok(self.matching(predicate).len() as u64)
    }

    async fn find_many(
        &self,
        predicate: &Predicate,
        order: OrderBy,
        window: Window,
    ) -> Result<Vec<Country>, StoreError> {
        self.begin_query()?;
        let mut rows = self.matching(predicate);
        order.sort(&mut rows);

        let skipped = rows.into_iter().skip(window.offset as usize);
        Ok(match window.limit {
            Some(limit) => skipped.take(limit as usize).collect(),
            None => skipped.collect(),
        })
    }

    async fn find_first(&self, predicate: &Predicate) -> Result<Option<Country>, StoreError> {
        self.begin_query()?;
        let mut rows = self.matching(predicate);
        OrderBy::by_name().sort(&mut rows);
        Ok(rows.into_iter().next())
    }

    async fn group_by_count(&self, field: CountryField) -> Result<Vec<(String, u64)>, StoreError> {
        self.begin_query()?;
        let mut groups: BTreeMap<String, u64> = BTreeMap::new();
        for (_, country) in self.data.pin().iter() {
            *groups
                .entry(country.field(field).to_string())
                .or_default() += 1;
        }
        Ok(groups.into_iter().collect())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
