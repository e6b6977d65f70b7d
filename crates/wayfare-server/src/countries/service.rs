//! Cache-aside country lookups with an offline fallback.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use wayfare_storage::{
    Country, CountryField, CountryStore, DynCountryStore, OrderBy, Predicate, Window,
};

use super::error::CountryError;
use super::fallback;
use super::keys;
use super::models::{ContinentSummary, CountryFilter, PageRequest, PageResult};
use crate::cache::{self, Cache, DynCache};
use crate::metrics;

/// Lifetime of every cached country entry.
pub const COUNTRY_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Builds the store predicate for a listing filter.
///
/// Continent is an exact match, region a substring match, and search a
/// substring match over name, alpha-2 and alpha-3 code combined with OR.
pub fn build_predicate(filter: &CountryFilter) -> Predicate {
    let filter = filter.normalized();
    let mut clauses = Vec::new();

    if let Some(continent) = filter.continent {
        clauses.push(Predicate::equals(CountryField::Continent, continent));
    }
    if let Some(region) = filter.region {
        clauses.push(Predicate::contains(CountryField::Region, region));
    }
    if let Some(search) = filter.search {
        clauses.push(Predicate::or(vec![
            Predicate::contains(CountryField::Name, search.as_str()),
            Predicate::contains(CountryField::Code, search.as_str()),
            Predicate::contains(CountryField::Code3, search),
        ]));
    }

    Predicate::and(clauses)
}

/// Read API over the country table.
///
/// Every operation checks the cache first. On a miss it reads the store's
/// connectivity flag: connected reads go to the store and populate the cache,
/// disconnected reads are answered from the offline dataset and never cached.
#[derive(Clone)]
pub struct CountryService {
    store: DynCountryStore,
    cache: DynCache,
}

impl CountryService {
    pub fn new(store: Arc<dyn CountryStore>, cache: Arc<dyn Cache>) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &DynCountryStore {
        &self.store
    }

    pub fn cache(&self) -> &DynCache {
        &self.cache
    }

    /// One page of countries matching `filter`, ordered by name.
    pub async fn list_countries(
        &self,
        filter: &CountryFilter,
        page: PageRequest,
    ) -> Result<PageResult<Country>, CountryError> {
        self.list_countries_inner(filter, page)
            .await
            .inspect_err(|e| log_failure("list_countries", e))
    }

    async fn list_countries_inner(
        &self,
        filter: &CountryFilter,
        page: PageRequest,
    ) -> Result<PageResult<Country>, CountryError> {
        let key = keys::filtered_key(filter, page)?;
        if let Some(hit) = self.cached::<PageResult<Country>>(&key).await? {
            return Ok(hit);
        }

        let predicate = build_predicate(filter);

        if !self.store.is_connected() {
            debug!(key = %key, "store disconnected, paging offline countries");
            metrics::record_fallback_served("list_countries");
            return Ok(fallback::page(&predicate, page));
        }

        let total = self.store.count(&predicate).await?;
        let data = self
            .store
            .find_many(&predicate, OrderBy::by_name(), page.window())
            .await?;
        let result = PageResult::new(data, page, total);

        self.populate(&key, &result).await?;
        Ok(result)
    }

    /// A single country by alpha-2 or alpha-3 code, ignoring case.
    pub async fn get_by_code(&self, code: &str) -> Result<Country, CountryError> {
        self.get_by_code_inner(code)
            .await
            .inspect_err(|e| log_failure("get_by_code", e))
    }

    async fn get_by_code_inner(&self, code: &str) -> Result<Country, CountryError> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(CountryError::not_found(code));
        }

        let key = keys::code_key(&code);
        if let Some(hit) = self.cached::<Country>(&key).await? {
            return Ok(hit);
        }

        if !self.store.is_connected() {
            metrics::record_fallback_served("get_by_code");
            return fallback::find_by_code(&code).ok_or_else(|| CountryError::not_found(code));
        }

        let predicate = Predicate::or(vec![
            Predicate::equals(CountryField::Code, code.as_str()),
            Predicate::equals(CountryField::Code3, code.as_str()),
        ]);
        let country = self
            .store
            .find_first(&predicate)
            .await?
            .ok_or_else(|| CountryError::not_found(code.as_str()))?;

        self.populate(&key, &country).await?;
        Ok(country)
    }

    /// Country counts per continent, ordered by continent name.
    pub async fn list_continents(&self) -> Result<Vec<ContinentSummary>, CountryError> {
        self.list_continents_inner()
            .await
            .inspect_err(|e| log_failure("list_continents", e))
    }

    async fn list_continents_inner(&self) -> Result<Vec<ContinentSummary>, CountryError> {
        if let Some(hit) = self.cached(keys::CONTINENTS_KEY).await? {
            return Ok(hit);
        }

        if !self.store.is_connected() {
            metrics::record_fallback_served("list_continents");
            return Ok(fallback::continent_summaries());
        }

        let mut summaries: Vec<ContinentSummary> = self
            .store
            .group_by_count(CountryField::Continent)
            .await?
            .into_iter()
            .map(|(name, country_count)| ContinentSummary {
                name,
                country_count,
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));

        self.populate(keys::CONTINENTS_KEY, &summaries).await?;
        Ok(summaries)
    }

    /// Every country, ordered by name.
    ///
    /// Always served from the cache or the store: there is no offline branch,
    /// so a disconnected store surfaces as an error on a cold cache.
    pub async fn list_all(&self) -> Result<Vec<Country>, CountryError> {
        self.list_all_inner()
            .await
            .inspect_err(|e| log_failure("list_all", e))
    }

    async fn list_all_inner(&self) -> Result<Vec<Country>, CountryError> {
        if let Some(hit) = self.cached(keys::ALL_KEY).await? {
            return Ok(hit);
        }

        let countries = self
            .store
            .find_many(&Predicate::All, OrderBy::by_name(), Window::unbounded())
            .await?;

        self.populate(keys::ALL_KEY, &countries).await?;
        Ok(countries)
    }

    /// Countries flagged as popular destinations, ordered by name.
    pub async fn list_popular(&self) -> Result<Vec<Country>, CountryError> {
        self.list_popular_inner()
            .await
            .inspect_err(|e| log_failure("list_popular", e))
    }

    async fn list_popular_inner(&self) -> Result<Vec<Country>, CountryError> {
        if let Some(hit) = self.cached(keys::POPULAR_KEY).await? {
            return Ok(hit);
        }

        if !self.store.is_connected() {
            metrics::record_fallback_served("list_popular");
            return Ok(fallback::popular());
        }

        let countries = self
            .store
            .find_many(
                &Predicate::IsPopular(true),
                OrderBy::by_name(),
                Window::unbounded(),
            )
            .await?;

        self.populate(keys::POPULAR_KEY, &countries).await?;
        Ok(countries)
    }

    /// Drops the aggregate listings (all, continents, popular).
    ///
    /// Filtered pages and per-code entries are left to expire.
    pub async fn invalidate_cache(&self) -> Result<(), CountryError> {
        for key in keys::INVALIDATED_KEYS {
            self.cache
                .delete(key)
                .await
                .inspect_err(|e| warn!(key, error = %e, "Failed to invalidate country cache key"))?;
        }
        info!(keys = ?keys::INVALIDATED_KEYS, "Country cache invalidated");
        Ok(())
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CountryError> {
        match self.cache.get(key).await? {
            Some(bytes) => {
                debug!(key = %key, "country cache hit");
                Ok(Some(cache::decode(&bytes)?))
            }
            None => Ok(None),
        }
    }

    async fn populate<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CountryError> {
        let bytes = cache::encode(value)?;
        self.cache.set(key, bytes, COUNTRY_CACHE_TTL).await?;
        Ok(())
    }
}

fn log_failure(operation: &'static str, err: &CountryError) {
    if err.is_upstream() {
        warn!(operation, error = %err, "Country lookup failed");
    } else {
        debug!(operation, error = %err, "Country lookup rejected");
    }
}
