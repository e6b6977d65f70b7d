//! Request and result shapes for the country lookup service.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use wayfare_api::PageMeta;
use wayfare_storage::Window;

use super::error::CountryError;

/// Optional filters applied to a country listing.
///
/// An absent field means no filtering on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryFilter {
    /// Exact continent name, case-insensitive.
    pub continent: Option<String>,
    /// Substring of the region, case-insensitive.
    pub region: Option<String>,
    /// Substring of the name, alpha-2 or alpha-3 code, case-insensitive.
    pub search: Option<String>,
}

impl CountryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_continent(mut self, continent: impl Into<String>) -> Self {
        self.continent = Some(continent.into());
        self
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Trims every value and drops blank ones.
    pub fn normalized(&self) -> Self {
        fn clean(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }
        Self {
            continent: clean(&self.continent),
            region: clean(&self.region),
            search: clean(&self.search),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.continent.is_none() && self.region.is_none() && self.search.is_none()
    }
}

/// 1-based page number and page size, both positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Result<Self, CountryError> {
        if page == 0 {
            return Err(CountryError::invalid_request("page must be a positive integer"));
        }
        if limit == 0 {
            return Err(CountryError::invalid_request("limit must be a positive integer"));
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn window(&self) -> Window {
        Window::new(self.offset(), u64::from(self.limit))
    }
}

/// One page of records plus pagination metadata.
///
/// `generated_at` is fixed when the page is assembled, so a cached page keeps
/// reporting the moment it was first computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

impl<T> PageResult<T> {
    pub fn new(data: Vec<T>, page: PageRequest, total: u64) -> Self {
        Self {
            data,
            meta: PageMeta::new(page.page(), page.limit(), total),
            generated_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Number of countries on one continent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinentSummary {
    pub name: String,
    pub country_count: u64,
}
