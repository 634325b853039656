//! Task — a to-do item that belongs to a subject, with a due date, an
//! urgency level and a completion flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr};

use crate::subject::SubjectId;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Store-assigned surrogate key for a task row.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl std::fmt::Display for TaskId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    self.0.fmt(f)
  }
}

// ─── Priority ────────────────────────────────────────────────────────────────

/// Task urgency. Persisted as its ordinal; `Ord` follows urgency so that
/// `High` sorts above `Low`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize,
  Deserialize, Display, EnumString, FromRepr,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum Priority {
  Low    = 0,
  #[default]
  Medium = 1,
  High   = 2,
}

impl Priority {
  /// Decode from a stored ordinal. Unknown values fall back to `Medium`
  /// rather than failing the whole row.
  pub fn from_ordinal(ordinal: i64) -> Self {
    u8::try_from(ordinal)
      .ok()
      .and_then(Self::from_repr)
      .unwrap_or_default()
  }

  /// The ordinal stored in the `priority` column.
  pub fn ordinal(self) -> i64 {
    self as i64
  }
}

// ─── Task ────────────────────────────────────────────────────────────────────

/// A persisted task.
///
/// `subject_name` is a denormalised copy of the owning subject's name, kept
/// so task lists render without a join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub task_id:      TaskId,
  pub subject_id:   SubjectId,
  pub subject_name: String,
  pub title:        String,
  pub description:  String,
  pub due_date:     DateTime<Utc>,
  pub priority:     Priority,
  pub complete:     bool,
}

impl Task {
  /// Due date formatted for display, e.g. `04 Sep 2026`.
  pub fn due_date_label(&self) -> String {
    self.due_date.format("%d %b %Y").to_string()
  }

  /// A draft of this task with the completion flag flipped, ready to be
  /// written back through the store.
  pub fn toggled(&self) -> TaskDraft {
    let mut draft = TaskDraft::from(self.clone());
    draft.complete = !draft.complete;
    draft
  }
}

/// Input to [`crate::store::StudyStore::upsert_task`].
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
  pub task_id:      Option<TaskId>,
  pub subject_id:   SubjectId,
  pub subject_name: String,
  pub title:        String,
  pub description:  String,
  pub due_date:     DateTime<Utc>,
  pub priority:     Priority,
  pub complete:     bool,
}

impl From<Task> for TaskDraft {
  fn from(task: Task) -> Self {
    Self {
      task_id:      Some(task.task_id),
      subject_id:   task.subject_id,
      subject_name: task.subject_name,
      title:        task.title,
      description:  task.description,
      due_date:     task.due_date,
      priority:     task.priority,
      complete:     task.complete,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn priority_ordinal_roundtrip() {
    for p in [Priority::Low, Priority::Medium, Priority::High] {
      assert_eq!(Priority::from_ordinal(p.ordinal()), p);
    }
  }

  #[test]
  fn unknown_ordinal_falls_back_to_medium() {
    assert_eq!(Priority::from_ordinal(7), Priority::Medium);
    assert_eq!(Priority::from_ordinal(-1), Priority::Medium);
  }

  #[test]
  fn priority_orders_by_urgency() {
    assert!(Priority::High > Priority::Medium);
    assert!(Priority::Medium > Priority::Low);
  }
}
