//! SQLite backend for the Pensum study store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Live query handles are driven
//! by a per-table change counter: every write bumps the counters for the
//! tables it touched, and each `watch_*` handle re-runs its query when a
//! counter it depends on moves.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
