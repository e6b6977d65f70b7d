//! In-memory country store backend for the Wayfare server.
//!
//! This crate provides an in-memory implementation of the `CountryStore`
//! trait from `wayfare-storage`, using papaya lock-free HashMap for
//! concurrent access. It backs local development and the test suites.
//!
//! # Example
//!
//! ```ignore
//! use wayfare_db_memory::InMemoryCountryStore;
//! use wayfare_storage::{CountryStore, Predicate};
//!
//! let store = InMemoryCountryStore::with_countries(seed);
//! let total = store.count(&Predicate::All).await?;
//! ```

pub mod storage;

pub use storage::InMemoryCountryStore;
pub use wayfare_storage::{CountryStore, StoreError};
