//! Repositories — cloneable, store-backed collaborators that shape raw
//! query results the way the screens consume them.
//!
//! Sorting and windowing live here rather than in SQL so every screen sees
//! the same ordering rules regardless of backend.

use std::sync::Arc;

use pensum_core::{
  live::Live,
  session::{Session, SessionDraft, SessionId},
  store::StudyStore,
  subject::{Subject, SubjectDraft, SubjectId},
  task::{Task, TaskDraft, TaskId},
};

// ─── Subjects ────────────────────────────────────────────────────────────────

pub struct SubjectRepository<S> {
  store: Arc<S>,
}

impl<S> Clone for SubjectRepository<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store) }
  }
}

impl<S: StudyStore + 'static> SubjectRepository<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  pub async fn upsert(&self, draft: SubjectDraft) -> Result<Subject, S::Error> {
    self.store.upsert_subject(draft).await
  }

  pub async fn get(&self, id: SubjectId) -> Result<Option<Subject>, S::Error> {
    self.store.get_subject(id).await
  }

  /// Remove the subject together with every task and session that belongs
  /// to it. Returns `false` when the subject row did not exist.
  pub async fn delete(&self, id: SubjectId) -> Result<bool, S::Error> {
    self.store.delete_subject_with_children(id).await
  }

  pub async fn subjects(&self) -> Result<Live<Vec<Subject>>, S::Error> {
    self.store.watch_subjects().await
  }

  pub async fn count(&self) -> Result<Live<u64>, S::Error> {
    self.store.watch_subject_count().await
  }

  pub async fn total_goal_hours(&self) -> Result<Live<f64>, S::Error> {
    self.store.watch_total_goal_hours().await
  }
}

// ─── Tasks ───────────────────────────────────────────────────────────────────

pub struct TaskRepository<S> {
  store: Arc<S>,
}

impl<S> Clone for TaskRepository<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store) }
  }
}

impl<S: StudyStore + 'static> TaskRepository<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  pub async fn upsert(&self, draft: TaskDraft) -> Result<Task, S::Error> {
    self.store.upsert_task(draft).await
  }

  pub async fn get(&self, id: TaskId) -> Result<Option<Task>, S::Error> {
    self.store.get_task(id).await
  }

  pub async fn delete(&self, id: TaskId) -> Result<bool, S::Error> {
    self.store.delete_task(id).await
  }

  /// Incomplete tasks across every subject, in agenda order.
  pub async fn upcoming(&self) -> Result<Live<Vec<Task>>, S::Error> {
    Ok(self.store.watch_tasks().await?.map(|tasks| agenda(tasks, false)))
  }

  /// Incomplete tasks for one subject, in agenda order.
  pub async fn upcoming_for_subject(
    &self,
    subject: SubjectId,
  ) -> Result<Live<Vec<Task>>, S::Error> {
    Ok(
      self
        .store
        .watch_tasks_for_subject(subject)
        .await?
        .map(|tasks| agenda(tasks, false)),
    )
  }

  /// Completed tasks for one subject, in agenda order.
  pub async fn completed_for_subject(
    &self,
    subject: SubjectId,
  ) -> Result<Live<Vec<Task>>, S::Error> {
    Ok(
      self
        .store
        .watch_tasks_for_subject(subject)
        .await?
        .map(|tasks| agenda(tasks, true)),
    )
  }
}

/// Agenda order: soonest due date first, higher priority breaking ties.
/// Remaining ties keep store order, which is insertion order.
fn agenda(tasks: &[Task], complete: bool) -> Vec<Task> {
  let mut out: Vec<Task> =
    tasks.iter().filter(|t| t.complete == complete).cloned().collect();
  out.sort_by(|a, b| {
    a.due_date.cmp(&b.due_date).then(b.priority.cmp(&a.priority))
  });
  out
}

// ─── Sessions ────────────────────────────────────────────────────────────────

pub struct SessionRepository<S> {
  store: Arc<S>,
}

impl<S> Clone for SessionRepository<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store) }
  }
}

impl<S: StudyStore + 'static> SessionRepository<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  pub async fn insert(&self, draft: SessionDraft) -> Result<Session, S::Error> {
    self.store.insert_session(draft).await
  }

  pub async fn delete(&self, id: SessionId) -> Result<bool, S::Error> {
    self.store.delete_session(id).await
  }

  /// Every session, most recent first.
  pub async fn all(&self) -> Result<Live<Vec<Session>>, S::Error> {
    Ok(self.store.watch_sessions().await?.map(|s| latest_first(s, None)))
  }

  /// The five most recent sessions across every subject.
  pub async fn recent_five(&self) -> Result<Live<Vec<Session>>, S::Error> {
    Ok(self.store.watch_sessions().await?.map(|s| latest_first(s, Some(5))))
  }

  /// The ten most recent sessions for one subject.
  pub async fn recent_ten_for_subject(
    &self,
    subject: SubjectId,
  ) -> Result<Live<Vec<Session>>, S::Error> {
    Ok(
      self
        .store
        .watch_sessions_for_subject(subject)
        .await?
        .map(|s| latest_first(s, Some(10))),
    )
  }

  pub async fn total_secs(&self) -> Result<Live<i64>, S::Error> {
    self.store.watch_total_session_secs().await
  }

  pub async fn secs_for_subject(
    &self,
    subject: SubjectId,
  ) -> Result<Live<i64>, S::Error> {
    self.store.watch_session_secs_for_subject(subject).await
  }
}

fn latest_first(sessions: &[Session], cap: Option<usize>) -> Vec<Session> {
  let mut out = sessions.to_vec();
  out.sort_by(|a, b| b.started_at.cmp(&a.started_at));
  if let Some(cap) = cap {
    out.truncate(cap);
  }
  out
}
