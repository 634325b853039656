//! The `StudyStore` trait — the persistence seam between the screen layer
//! and a concrete backend.
//!
//! The trait is implemented by storage backends (e.g.
//! `pensum-store-sqlite`). The screen layer depends on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  live::Live,
  session::{Session, SessionDraft, SessionId},
  subject::{Subject, SubjectDraft, SubjectId},
  task::{Task, TaskDraft, TaskId},
};

/// Abstraction over a study-store backend.
///
/// The `watch_*` methods return [`Live`] handles: the current query result
/// plus every future result, re-read after each write that touches the
/// queried table. Handles stay coherent with point reads made through the
/// same store.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait StudyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Insert `draft`, or replace the existing row when `draft.subject_id`
  /// is set. Returns the persisted subject with its assigned id.
  fn upsert_subject(
    &self,
    draft: SubjectDraft,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Retrieve a subject by id. Returns `None` if not found.
  fn get_subject(
    &self,
    id: SubjectId,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Delete the subject row alone, leaving tasks and sessions in place.
  /// Returns `false` when no row matched.
  fn delete_subject(
    &self,
    id: SubjectId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete the subject's tasks, then its sessions, then the subject row
  /// itself, atomically. Returns `false` when the subject row did not
  /// exist (any orphaned children are still removed).
  fn delete_subject_with_children(
    &self,
    id: SubjectId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn watch_subjects(
    &self,
  ) -> impl Future<Output = Result<Live<Vec<Subject>>, Self::Error>> + Send + '_;

  fn watch_subject_count(
    &self,
  ) -> impl Future<Output = Result<Live<u64>, Self::Error>> + Send + '_;

  /// Sum of `goal_hours` across all subjects; `0` when there are none.
  fn watch_total_goal_hours(
    &self,
  ) -> impl Future<Output = Result<Live<f64>, Self::Error>> + Send + '_;

  // ── Tasks ─────────────────────────────────────────────────────────────

  /// Insert `draft`, or replace the existing row when `draft.task_id` is
  /// set. Returns the persisted task with its assigned id.
  fn upsert_task(
    &self,
    draft: TaskDraft,
  ) -> impl Future<Output = Result<Task, Self::Error>> + Send + '_;

  /// Retrieve a task by id. Returns `None` if not found.
  fn get_task(
    &self,
    id: TaskId,
  ) -> impl Future<Output = Result<Option<Task>, Self::Error>> + Send + '_;

  /// Returns `false` when no row matched.
  fn delete_task(
    &self,
    id: TaskId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete every task belonging to `subject`. Returns the number of rows
  /// removed.
  fn delete_tasks_for_subject(
    &self,
    subject: SubjectId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn watch_tasks(
    &self,
  ) -> impl Future<Output = Result<Live<Vec<Task>>, Self::Error>> + Send + '_;

  fn watch_tasks_for_subject(
    &self,
    subject: SubjectId,
  ) -> impl Future<Output = Result<Live<Vec<Task>>, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Sessions are append-only: there is no update path.
  fn insert_session(
    &self,
    draft: SessionDraft,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Returns `false` when no row matched.
  fn delete_session(
    &self,
    id: SessionId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete every session belonging to `subject`. Returns the number of
  /// rows removed.
  fn delete_sessions_for_subject(
    &self,
    subject: SubjectId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn watch_sessions(
    &self,
  ) -> impl Future<Output = Result<Live<Vec<Session>>, Self::Error>> + Send + '_;

  fn watch_sessions_for_subject(
    &self,
    subject: SubjectId,
  ) -> impl Future<Output = Result<Live<Vec<Session>>, Self::Error>> + Send + '_;

  /// Sum of `duration_secs` across all sessions; `0` when there are none.
  fn watch_total_session_secs(
    &self,
  ) -> impl Future<Output = Result<Live<i64>, Self::Error>> + Send + '_;

  /// Sum of `duration_secs` for one subject; `0` when it has no sessions.
  fn watch_session_secs_for_subject(
    &self,
    subject: SubjectId,
  ) -> impl Future<Output = Result<Live<i64>, Self::Error>> + Send + '_;
}
