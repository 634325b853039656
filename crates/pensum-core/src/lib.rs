//! Core types and trait definitions for the Pensum study tracker.
//!
//! This crate is deliberately free of database dependencies. The storage
//! backend (`pensum-store-sqlite`) and the screen layer (`pensum-screens`)
//! both build on it; it depends only on the async runtime.

pub mod error;
pub mod live;
pub mod progress;
pub mod session;
pub mod store;
pub mod subject;
pub mod task;
pub mod validate;

pub use error::{Error, Result};
