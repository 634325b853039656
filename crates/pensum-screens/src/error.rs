//! Error type for `pensum-screens`.

use pensum_core::{subject::SubjectId, task::TaskId};
use thiserror::Error;

/// An error raised while opening a screen. Command handlers never return
/// errors; they report failures through notices instead.
#[derive(Debug, Error)]
pub enum Error {
  #[error("subject {0} not found")]
  SubjectNotFound(SubjectId),

  #[error("task {0} not found")]
  TaskNotFound(TaskId),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box an arbitrary backend error.
  pub fn store<E>(error: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(error))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
