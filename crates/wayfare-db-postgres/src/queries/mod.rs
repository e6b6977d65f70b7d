//! SQL query modules for the PostgreSQL country store.
//!
//! - [`filter`] compiles a [`wayfare_storage::Predicate`] into a parameterized
//!   `WHERE` clause.
//! - [`countries`] executes count, page, lookup, and grouped-count queries.

pub mod countries;
pub mod filter;

pub use filter::{BuiltQuery, SqlValue, compile_predicate};
