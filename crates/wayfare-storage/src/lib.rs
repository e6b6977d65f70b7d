//! # wayfare-storage
//!
//! Store gateway abstraction for the Wayfare country service.
//!
//! This crate defines the traits and types that all country store backends
//! must implement. It does not contain any implementations; those live in
//! `wayfare-db-postgres` and `wayfare-db-memory`.
//!
//! ## Example
//!
//! ```ignore
//! use wayfare_storage::{CountryField, CountryStore, OrderBy, Predicate, Window};
//!
//! async fn first_page(store: &dyn CountryStore) -> Result<Vec<Country>, StoreError> {
//!     let predicate = Predicate::contains(CountryField::Region, "europe");
//!     store.find_many(&predicate, OrderBy::by_name(), Window::new(0, 10)).await
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StoreError};
pub use traits::CountryStore;
pub use types::{Country, CountryField, OrderBy, Predicate, Window};

/// Type alias for a shared store trait object.
pub type DynCountryStore = std::sync::Arc<dyn CountryStore>;
