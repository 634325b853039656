//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, palettes as compact JSON
//! `[start, end]` pairs, priorities as their ordinal.

use chrono::{DateTime, Utc};
use pensum_core::{
  session::{Session, SessionId},
  subject::{Palette, Subject, SubjectId},
  task::{Priority, Task, TaskId},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Palette ─────────────────────────────────────────────────────────────────

pub fn encode_palette(p: Palette) -> Result<String> {
  Ok(serde_json::to_string(&p)?)
}

pub fn decode_palette(s: &str) -> Result<Palette> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id: i64,
  pub name:       String,
  pub goal_hours: f64,
  pub palette:    String,
}

impl RawSubject {
  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id: SubjectId(self.subject_id),
      name:       self.name,
      goal_hours: self.goal_hours,
      palette:    decode_palette(&self.palette)?,
    })
  }
}

/// Raw values read directly from a `tasks` row.
pub struct RawTask {
  pub task_id:      i64,
  pub subject_id:   i64,
  pub subject_name: String,
  pub title:        String,
  pub description:  String,
  pub due_date:     String,
  pub priority:     i64,
  pub complete:     bool,
}

impl RawTask {
  pub fn into_task(self) -> Result<Task> {
    Ok(Task {
      task_id:      TaskId(self.task_id),
      subject_id:   SubjectId(self.subject_id),
      subject_name: self.subject_name,
      title:        self.title,
      description:  self.description,
      due_date:     decode_dt(&self.due_date)?,
      // Unknown ordinals degrade to Medium instead of failing the row.
      priority:     Priority::from_ordinal(self.priority),
      complete:     self.complete,
    })
  }
}

/// Raw values read directly from a `sessions` row.
pub struct RawSession {
  pub session_id:   i64,
  pub subject_id:   i64,
  pub subject_name: String,
  pub started_at:   String,
  pub duration:     i64,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      session_id:    SessionId(self.session_id),
      subject_id:    SubjectId(self.subject_id),
      subject_name:  self.subject_name,
      started_at:    decode_dt(&self.started_at)?,
      duration_secs: self.duration,
    })
  }
}
