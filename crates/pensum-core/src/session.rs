//! Session — a completed, timed study interval attributed to a subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::subject::SubjectId;

/// Shortest session the store will accept, in seconds. Anything under this
/// is treated as an accidental start/stop rather than real study time.
pub const MIN_SESSION_SECS: i64 = 36;

/// Store-assigned surrogate key for a session row.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl std::fmt::Display for SessionId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    self.0.fmt(f)
  }
}

/// A persisted study session. Sessions are only ever inserted and deleted,
/// never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
  pub session_id:    SessionId,
  pub subject_id:    SubjectId,
  /// Denormalised copy of the subject name at recording time.
  pub subject_name:  String,
  pub started_at:    DateTime<Utc>,
  pub duration_secs: i64,
}

impl Session {
  /// Start date formatted for display, e.g. `04 Sep 2026`.
  pub fn date_label(&self) -> String {
    self.started_at.format("%d %b %Y").to_string()
  }
}

/// Input to [`crate::store::StudyStore::insert_session`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDraft {
  pub subject_id:    SubjectId,
  pub subject_name:  String,
  pub started_at:    DateTime<Utc>,
  pub duration_secs: i64,
}
