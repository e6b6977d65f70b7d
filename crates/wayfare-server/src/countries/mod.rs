//! Country reference lookups.
//!
//! [`CountryService`] is a cache-aside read path over a [`wayfare_storage::CountryStore`]
//! that switches to a fixed offline dataset while the store is disconnected.

mod error;
pub mod fallback;
pub mod handlers;
pub mod keys;
mod models;
pub mod service;

pub use error::CountryError;
pub use models::{ContinentSummary, CountryFilter, PageRequest, PageResult};
pub use service::{COUNTRY_CACHE_TTL, CountryService, build_predicate};
