//! Cache key policy for country lookups.
//!
//! Aggregate listings live under fixed keys. Filtered pages are keyed by the
//! JSON form of [`FilteredKey`], whose field order is its declaration order,
//! so equal filters always produce byte-identical keys.

use serde::Serialize;

use super::models::{CountryFilter, PageRequest};
use crate::cache::CacheError;

pub const ALL_KEY: &str = "countries:all";
pub const CONTINENTS_KEY: &str = "countries:continents";
pub const POPULAR_KEY: &str = "countries:popular";

const CODE_PREFIX: &str = "country:code:";
const FILTERED_PREFIX: &str = "countries:filtered:";

/// Keys removed by an explicit invalidation.
///
/// Per-code and per-filter entries are not tracked and expire on their own.
pub const INVALIDATED_KEYS: [&str; 3] = [ALL_KEY, CONTINENTS_KEY, POPULAR_KEY];

#[derive(Serialize)]
struct FilteredKey {
    continent: Option<String>,
    region: Option<String>,
    search: Option<String>,
    page: u32,
    limit: u32,
}

/// Key for a single country; `code` is expected to be uppercase already.
pub fn code_key(code: &str) -> String {
    format!("{CODE_PREFIX}{code}")
}

/// Key for one page of a filtered listing.
///
/// Values are trimmed and lowercased so requests that differ only in case or
/// surrounding whitespace share an entry.
pub fn filtered_key(filter: &CountryFilter, page: PageRequest) -> Result<String, CacheError> {
    let filter = filter.normalized();
    let key = FilteredKey {
        continent: filter.continent.map(|v| v.to_lowercase()),
        region: filter.region.map(|v| v.to_lowercase()),
        search: filter.search.map(|v| v.to_lowercase()),
        page: page.page(),
        limit: page.limit(),
    };
    let json = serde_json::to_string(&key).map_err(|e| CacheError::serialization(e.to_string()))?;
    Ok(format!("{FILTERED_PREFIX}{json}"))
}
