//! Integration tests for `SqliteStore` against an in-memory database.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use pensum_core::{
  session::SessionDraft,
  store::StudyStore,
  subject::{Palette, Subject, SubjectDraft, SubjectId},
  task::{Priority, TaskDraft, TaskId},
};

use crate::{SqliteStore, schema::MIGRATIONS};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn subject_draft(name: &str, goal_hours: f64) -> SubjectDraft {
  SubjectDraft {
    subject_id: None,
    name: name.into(),
    goal_hours,
    palette: Palette::PRESETS[0],
  }
}

fn task_draft(subject: &Subject, title: &str) -> TaskDraft {
  TaskDraft {
    task_id:      None,
    subject_id:   subject.subject_id,
    subject_name: subject.name.clone(),
    title:        title.into(),
    description:  String::new(),
    due_date:     Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap(),
    priority:     Priority::Medium,
    complete:     false,
  }
}

fn session_draft(subject: &Subject, secs: i64) -> SessionDraft {
  SessionDraft {
    subject_id:    subject.subject_id,
    subject_name:  subject.name.clone(),
    started_at:    Utc.with_ymd_and_hms(2026, 8, 20, 9, 30, 0).unwrap(),
    duration_secs: secs,
  }
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_get_subject() {
  let s = store().await;

  let subject = s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();
  assert!(subject.subject_id.0 >= 1);

  let fetched = s.get_subject(subject.subject_id).await.unwrap();
  assert_eq!(fetched, Some(subject));
}

#[tokio::test]
async fn get_subject_missing_returns_none() {
  let s = store().await;
  let result = s.get_subject(SubjectId(99)).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn upsert_with_id_replaces_row() {
  let s = store().await;
  let subject = s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();

  let mut draft = SubjectDraft::from(subject.clone());
  draft.name = "Applied Maths".into();
  draft.goal_hours = 7.5;
  let updated = s.upsert_subject(draft).await.unwrap();
  assert_eq!(updated.subject_id, subject.subject_id);

  let subjects = s.watch_subjects().await.unwrap().get();
  assert_eq!(subjects.len(), 1);
  assert_eq!(subjects[0].name, "Applied Maths");
  assert_eq!(subjects[0].goal_hours, 7.5);
}

#[tokio::test]
async fn delete_subject_reports_matched_row() {
  let s = store().await;
  let subject = s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();

  assert!(s.delete_subject(subject.subject_id).await.unwrap());
  assert!(!s.delete_subject(subject.subject_id).await.unwrap());
}

#[tokio::test]
async fn subject_aggregates() {
  let s = store().await;
  assert_eq!(s.watch_subject_count().await.unwrap().get(), 0);
  assert_eq!(s.watch_total_goal_hours().await.unwrap().get(), 0.0);

  s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();
  s.upsert_subject(subject_draft("Physics", 12.5)).await.unwrap();

  assert_eq!(s.watch_subject_count().await.unwrap().get(), 2);
  assert_eq!(s.watch_total_goal_hours().await.unwrap().get(), 17.5);
}

// ─── Tasks ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_get_task() {
  let s = store().await;
  let subject = s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();

  let mut draft = task_draft(&subject, "Revise");
  draft.description = "chapters 1-3".into();
  draft.priority = Priority::High;
  let task = s.upsert_task(draft).await.unwrap();
  assert!(task.task_id.0 >= 1);

  let fetched = s.get_task(task.task_id).await.unwrap();
  assert_eq!(fetched, Some(task));
}

#[tokio::test]
async fn get_task_missing_returns_none() {
  let s = store().await;
  let result = s.get_task(TaskId(99)).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn upsert_task_with_id_replaces_row() {
  let s = store().await;
  let subject = s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();
  let task = s.upsert_task(task_draft(&subject, "Revise")).await.unwrap();

  let updated = s.upsert_task(task.toggled()).await.unwrap();
  assert_eq!(updated.task_id, task.task_id);
  assert!(updated.complete);

  let tasks = s.watch_tasks().await.unwrap().get();
  assert_eq!(tasks.len(), 1);
  assert!(tasks[0].complete);
}

#[tokio::test]
async fn reupserting_an_unchanged_task_is_idempotent() {
  let s = store().await;
  let subject = s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();
  let task = s.upsert_task(task_draft(&subject, "Revise")).await.unwrap();

  let rewritten = s.upsert_task(TaskDraft::from(task.clone())).await.unwrap();
  assert_eq!(rewritten, task);

  let tasks = s.watch_tasks().await.unwrap().get();
  assert_eq!(tasks, vec![task]);
}

#[tokio::test]
async fn delete_task_reports_matched_row() {
  let s = store().await;
  let subject = s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();
  let task = s.upsert_task(task_draft(&subject, "Revise")).await.unwrap();

  assert!(s.delete_task(task.task_id).await.unwrap());
  assert!(!s.delete_task(task.task_id).await.unwrap());
}

#[tokio::test]
async fn delete_tasks_for_subject_counts_rows() {
  let s = store().await;
  let maths = s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();
  let physics = s.upsert_subject(subject_draft("Physics", 8.0)).await.unwrap();

  s.upsert_task(task_draft(&maths, "Revise")).await.unwrap();
  s.upsert_task(task_draft(&maths, "Exercises")).await.unwrap();
  s.upsert_task(task_draft(&physics, "Lab report")).await.unwrap();

  assert_eq!(s.delete_tasks_for_subject(maths.subject_id).await.unwrap(), 2);
  assert_eq!(s.delete_tasks_for_subject(maths.subject_id).await.unwrap(), 0);

  let remaining = s.watch_tasks().await.unwrap().get();
  assert_eq!(remaining.len(), 1);
  assert_eq!(remaining[0].subject_id, physics.subject_id);
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_session_and_list() {
  let s = store().await;
  let subject = s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();

  let session = s.insert_session(session_draft(&subject, 600)).await.unwrap();
  assert!(session.session_id.0 >= 1);

  let sessions = s.watch_sessions().await.unwrap().get();
  assert_eq!(sessions, vec![session]);
}

#[tokio::test]
async fn delete_session_reports_matched_row() {
  let s = store().await;
  let subject = s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();
  let session = s.insert_session(session_draft(&subject, 600)).await.unwrap();

  assert!(s.delete_session(session.session_id).await.unwrap());
  assert!(!s.delete_session(session.session_id).await.unwrap());
}

#[tokio::test]
async fn session_second_totals() {
  let s = store().await;
  let maths = s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();
  let physics = s.upsert_subject(subject_draft("Physics", 8.0)).await.unwrap();

  assert_eq!(s.watch_total_session_secs().await.unwrap().get(), 0);

  s.insert_session(session_draft(&maths, 600)).await.unwrap();
  s.insert_session(session_draft(&maths, 300)).await.unwrap();
  s.insert_session(session_draft(&physics, 450)).await.unwrap();

  assert_eq!(s.watch_total_session_secs().await.unwrap().get(), 1350);
  assert_eq!(
    s.watch_session_secs_for_subject(maths.subject_id)
      .await
      .unwrap()
      .get(),
    900
  );
  assert_eq!(
    s.watch_session_secs_for_subject(physics.subject_id)
      .await
      .unwrap()
      .get(),
    450
  );
}

// ─── Cascade delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn cascade_delete_removes_children() {
  let s = store().await;
  let maths = s.upsert_subject(subject_draft("Maths", 10.0)).await.unwrap();
  let physics = s.upsert_subject(subject_draft("Physics", 8.0)).await.unwrap();

  s.upsert_task(task_draft(&maths, "Revise")).await.unwrap();
  s.upsert_task(task_draft(&maths, "Exercises")).await.unwrap();
  s.upsert_task(task_draft(&physics, "Lab report")).await.unwrap();
  s.insert_session(session_draft(&maths, 600)).await.unwrap();
  s.insert_session(session_draft(&physics, 300)).await.unwrap();

  assert!(s.delete_subject_with_children(maths.subject_id).await.unwrap());

  assert!(s.get_subject(maths.subject_id).await.unwrap().is_none());
  let tasks = s.watch_tasks().await.unwrap().get();
  assert_eq!(tasks.len(), 1);
  assert_eq!(tasks[0].subject_id, physics.subject_id);
  let sessions = s.watch_sessions().await.unwrap().get();
  assert_eq!(sessions.len(), 1);
  assert_eq!(sessions[0].subject_id, physics.subject_id);
}

#[tokio::test]
async fn cascade_delete_missing_subject_still_clears_orphans() {
  let s = store().await;
  let ghost = SubjectId(42);

  s.upsert_task(TaskDraft {
    task_id:      None,
    subject_id:   ghost,
    subject_name: "Ghost".into(),
    title:        "Orphaned".into(),
    description:  String::new(),
    due_date:     Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap(),
    priority:     Priority::Low,
    complete:     false,
  })
  .await
  .unwrap();
  s.insert_session(SessionDraft {
    subject_id:    ghost,
    subject_name:  "Ghost".into(),
    started_at:    Utc.with_ymd_and_hms(2026, 8, 20, 9, 30, 0).unwrap(),
    duration_secs: 120,
  })
  .await
  .unwrap();

  assert!(!s.delete_subject_with_children(ghost).await.unwrap());
  assert!(s.watch_tasks().await.unwrap().get().is_empty());
  assert!(s.watch_sessions().await.unwrap().get().is_empty());
}

// ─── Live queries ────────────────────────────────────────────────────────────

#[tokio::test]
async fn watch_subjects_sees_later_writes() {
  let s = store().await;
  let mut subjects = s.watch_subjects().await.unwrap();
  assert!(subjects.get().is_empty());

  s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();

  let listed = subjects.next().await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].name, "Maths");
}

#[tokio::test]
async fn watch_tasks_for_subject_filters_other_subjects() {
  let s = store().await;
  let maths = s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();
  let physics = s.upsert_subject(subject_draft("Physics", 8.0)).await.unwrap();
  s.upsert_task(task_draft(&maths, "Revise")).await.unwrap();

  let mut maths_tasks =
    s.watch_tasks_for_subject(maths.subject_id).await.unwrap();
  assert_eq!(maths_tasks.get().len(), 1);

  // A write for another subject bumps the table but leaves this filtered
  // view unchanged, so only the second write below may surface.
  s.upsert_task(task_draft(&physics, "Lab report")).await.unwrap();
  s.upsert_task(task_draft(&maths, "Exercises")).await.unwrap();

  let listed = maths_tasks.next().await.unwrap();
  assert_eq!(listed.len(), 2);
  assert!(listed.iter().all(|t| t.subject_id == maths.subject_id));
}

#[tokio::test]
async fn unchanged_result_is_not_reemitted() {
  let s = store().await;
  let subject = s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();

  let mut count = s.watch_subject_count().await.unwrap();
  assert_eq!(count.get(), 1);

  // Rewriting the same subject bumps the table, but the count query still
  // returns 1 and nothing new is published.
  s.upsert_subject(SubjectDraft::from(subject)).await.unwrap();
  let quiet =
    tokio::time::timeout(Duration::from_millis(200), count.changed()).await;
  assert!(quiet.is_err());
}

// ─── Migration ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn v1_database_upgrades_in_place() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("study.db");

  {
    let conn = rusqlite::Connection::open(&path).expect("raw open");
    conn.execute_batch(MIGRATIONS[0]).expect("v1 schema");
    conn.pragma_update(None, "user_version", 1).expect("set version");
    conn
      .execute(
        "INSERT INTO subjects (name, goal_hours, palette)
         VALUES ('Maths', 10.0, '[4294934352,4292072403]')",
        [],
      )
      .expect("insert subject");
    // A v1 task row: no description column, and a priority ordinal that
    // no longer exists.
    conn
      .execute(
        "INSERT INTO tasks (subject_id, subject_name, title, due_date,
                            priority, complete)
         VALUES (1, 'Maths', 'Revise', '2026-09-01T12:00:00+00:00', 9, 0)",
        [],
      )
      .expect("insert legacy task");
  }

  let s = SqliteStore::open(&path).await.expect("open upgraded store");

  let subject = s.get_subject(SubjectId(1)).await.unwrap().expect("subject");
  assert_eq!(subject.palette, Palette::PRESETS[0]);

  let task = s.get_task(TaskId(1)).await.unwrap().expect("legacy task");
  assert_eq!(task.description, "");
  assert_eq!(task.priority, Priority::Medium);

  // The added column is fully usable after the upgrade.
  let mut draft = task_draft(&subject, "Read chapter 4");
  draft.description = "pages 120-160".into();
  let written = s.upsert_task(draft).await.unwrap();
  let fetched = s.get_task(written.task_id).await.unwrap().unwrap();
  assert_eq!(fetched.description, "pages 120-160");
}

#[tokio::test]
async fn reopening_latest_version_is_a_noop() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("study.db");

  {
    let s = SqliteStore::open(&path).await.expect("first open");
    s.upsert_subject(subject_draft("Maths", 5.0)).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.expect("second open");
  let subjects = s.watch_subjects().await.unwrap().get();
  assert_eq!(subjects.len(), 1);
  assert_eq!(subjects[0].name, "Maths");
}
