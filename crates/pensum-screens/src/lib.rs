//! Screen state for the study tracker, backend-agnostic over
//! [`pensum_core::store::StudyStore`].
//!
//! Each screen owns a [`pensum_core::live::SharedLive`] pipeline that
//! merges its live store queries with locally edited form input into one
//! renderable snapshot. Pipelines run only while the snapshot is observed,
//! with a short grace window so a rebuild of the observer (a rotation, a
//! brief navigation) reuses the running pipeline. Commands flow the other
//! way: validate, write through a repository, then report through a
//! one-shot [`Notice`].

pub mod dashboard;
pub mod error;
pub mod notice;
pub mod repo;
pub mod session;
pub mod subject;
pub mod task;

pub use error::{Error, Result};
pub use notice::{MessageKind, Notice};

use std::time::Duration;

/// How long a screen pipeline keeps running after its last observer leaves.
pub(crate) const STATE_GRACE: Duration = Duration::from_secs(5);
