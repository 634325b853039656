//! Subject — a user-defined study topic with an hours goal and a colour tag.

use serde::{Deserialize, Serialize};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Store-assigned surrogate key for a subject row.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct SubjectId(pub i64);

impl std::fmt::Display for SubjectId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    self.0.fmt(f)
  }
}

// ─── Palette ─────────────────────────────────────────────────────────────────

/// A two-colour gradient, stored as a `[start, end]` pair of packed ARGB
/// values and rendered top to bottom on a subject card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette(pub [u32; 2]);

impl Palette {
  pub const CORAL_TO_GREY: Palette = Palette([0xFFFF_7F50, 0xFFD3_D3D3]);
  pub const CORAL_TO_PEACH: Palette = Palette([0xFFFF_7F50, 0xFFFF_DAB9]);
  pub const CORAL_TO_YELLOW: Palette = Palette([0xFFFF_7F50, 0xFFFF_FFE0]);

  /// The built-in gradients offered when creating a subject.
  pub const PRESETS: [Palette; 3] =
    [Self::CORAL_TO_GREY, Self::CORAL_TO_PEACH, Self::CORAL_TO_YELLOW];

  pub fn start(&self) -> u32 {
    self.0[0]
  }

  pub fn end(&self) -> u32 {
    self.0[1]
  }
}

// ─── Subject ─────────────────────────────────────────────────────────────────

/// A persisted study subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id: SubjectId,
  pub name:       String,
  /// Target study time for this subject, in hours.
  pub goal_hours: f64,
  pub palette:    Palette,
}

/// Input to [`crate::store::StudyStore::upsert_subject`].
/// `subject_id` is `None` for a subject that has never been persisted; the
/// store assigns one on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectDraft {
  pub subject_id: Option<SubjectId>,
  pub name:       String,
  pub goal_hours: f64,
  pub palette:    Palette,
}

impl From<Subject> for SubjectDraft {
  fn from(subject: Subject) -> Self {
    Self {
      subject_id: Some(subject.subject_id),
      name:       subject.name,
      goal_hours: subject.goal_hours,
      palette:    subject.palette,
    }
  }
}

/// A lightweight reference to a subject: its id plus display name. Used
/// where a screen tracks "the selected subject" without holding the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRef {
  pub subject_id: SubjectId,
  pub name:       String,
}

impl From<&Subject> for SubjectRef {
  fn from(subject: &Subject) -> Self {
    Self {
      subject_id: subject.subject_id,
      name:       subject.name.clone(),
    }
  }
}
