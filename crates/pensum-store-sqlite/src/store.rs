//! [`SqliteStore`] — the SQLite implementation of [`StudyStore`].

use std::path::Path;

use pensum_core::{
  live::{self, Live},
  session::{Session, SessionDraft, SessionId},
  store::StudyStore,
  subject::{Subject, SubjectDraft, SubjectId},
  task::{Task, TaskDraft, TaskId},
};
use rusqlite::OptionalExtension as _;
use tokio::sync::watch;

use crate::{
  Error, Result,
  encode::{RawSession, RawSubject, RawTask, encode_dt, encode_palette},
  schema::MIGRATIONS,
};

// ─── Change hub ──────────────────────────────────────────────────────────────

/// Tables a live query can depend on. Doubles as the index into
/// [`Generations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
  Subjects = 0,
  Tasks    = 1,
  Sessions = 2,
}

/// One monotonically increasing write counter per table.
type Generations = [u64; 3];

// ─── Store ───────────────────────────────────────────────────────────────────

/// A study store backed by a single SQLite file.
///
/// Cloning is cheap — the connection handle and the change hub are shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
  hub:  watch::Sender<Generations>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and apply pending migrations.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::init(tokio_rusqlite::Connection::open(path).await?).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    Self::init(tokio_rusqlite::Connection::open_in_memory().await?).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (hub, _) = watch::channel([0; 3]);
    let store = Self { conn, hub };
    store.migrate().await?;
    Ok(store)
  }

  async fn migrate(&self) -> Result<()> {
    let (from, to) = self
      .conn
      .call(|conn| {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        let from: i64 =
          conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        let to = MIGRATIONS.len() as i64;
        if from < to {
          let tx = conn.transaction()?;
          for sql in &MIGRATIONS[from as usize..] {
            tx.execute_batch(sql)?;
          }
          tx.pragma_update(None, "user_version", to)?;
          tx.commit()?;
        }
        Ok((from, to))
      })
      .await?;
    if from < to {
      tracing::info!(from, to, "study store schema migrated");
    }
    Ok(())
  }

  /// Mark `tables` dirty, waking every live query that depends on one of
  /// them.
  fn bump(&self, tables: &[Table]) {
    self.hub.send_modify(|generations| {
      for table in tables {
        generations[*table as usize] += 1;
      }
    });
  }

  /// Build a live handle for `query`: run it once for the initial value,
  /// then re-run it after every write that bumps one of `tables`. Results
  /// equal to the previous one are not re-emitted. The producer task exits
  /// when every handle is dropped or the store itself goes away.
  async fn live<T, F>(&self, tables: &'static [Table], query: F) -> Result<Live<T>>
  where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: Fn(&mut rusqlite::Connection) -> Result<T>
      + Clone
      + Send
      + Sync
      + 'static,
  {
    let mut generations = self.hub.subscribe();
    // Snapshot the counters before the initial read: a write landing in
    // between triggers one redundant refresh rather than a missed one.
    let mut seen = *generations.borrow_and_update();
    let q = query.clone();
    let initial = self.conn.call(move |conn| Ok(q(conn))).await??;
    let (tx, handle) = live::channel(initial);
    let conn = self.conn.clone();

    tokio::spawn(async move {
      loop {
        tokio::select! {
          changed = generations.changed() => {
            if changed.is_err() {
              break;
            }
            let now = *generations.borrow_and_update();
            if tables.iter().all(|t| now[*t as usize] == seen[*t as usize]) {
              continue;
            }
            seen = now;
            let q = query.clone();
            let refreshed: Result<T> = conn
              .call(move |conn| Ok(q(conn)))
              .await
              .map_err(Error::from)
              .and_then(|inner| inner);
            match refreshed {
              Ok(next) => {
                tx.send_if_modified(|current| {
                  if *current == next {
                    false
                  } else {
                    *current = next;
                    true
                  }
                });
              }
              Err(e) => tracing::warn!(error = %e, "live query refresh failed"),
            }
          }
          () = tx.closed() => break,
        }
      }
    });

    Ok(handle)
  }
}

// ─── Queries ─────────────────────────────────────────────────────────────────

fn select_subjects(conn: &mut rusqlite::Connection) -> Result<Vec<Subject>> {
  let mut stmt = conn.prepare(
    "SELECT subject_id, name, goal_hours, palette
     FROM subjects ORDER BY subject_id",
  )?;
  let raws = stmt
    .query_map([], |row| {
      Ok(RawSubject {
        subject_id: row.get(0)?,
        name:       row.get(1)?,
        goal_hours: row.get(2)?,
        palette:    row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawSubject::into_subject).collect()
}

fn select_tasks(
  conn: &mut rusqlite::Connection,
  subject: Option<SubjectId>,
) -> Result<Vec<Task>> {
  let sql = match subject {
    Some(_) => {
      "SELECT task_id, subject_id, subject_name, title, description,
              due_date, priority, complete
       FROM tasks WHERE subject_id = ?1 ORDER BY task_id"
    }
    None => {
      "SELECT task_id, subject_id, subject_name, title, description,
              due_date, priority, complete
       FROM tasks ORDER BY task_id"
    }
  };
  let mut stmt = conn.prepare(sql)?;
  let map_row = |row: &rusqlite::Row<'_>| {
    Ok(RawTask {
      task_id:      row.get(0)?,
      subject_id:   row.get(1)?,
      subject_name: row.get(2)?,
      title:        row.get(3)?,
      description:  row.get(4)?,
      due_date:     row.get(5)?,
      priority:     row.get(6)?,
      complete:     row.get(7)?,
    })
  };
  let raws = match subject {
    Some(id) => stmt
      .query_map(rusqlite::params![id.0], map_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?,
    None => stmt
      .query_map([], map_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?,
  };
  raws.into_iter().map(RawTask::into_task).collect()
}

fn select_sessions(
  conn: &mut rusqlite::Connection,
  subject: Option<SubjectId>,
) -> Result<Vec<Session>> {
  let sql = match subject {
    Some(_) => {
      "SELECT session_id, subject_id, subject_name, started_at, duration
       FROM sessions WHERE subject_id = ?1 ORDER BY session_id"
    }
    None => {
      "SELECT session_id, subject_id, subject_name, started_at, duration
       FROM sessions ORDER BY session_id"
    }
  };
  let mut stmt = conn.prepare(sql)?;
  let map_row = |row: &rusqlite::Row<'_>| {
    Ok(RawSession {
      session_id:   row.get(0)?,
      subject_id:   row.get(1)?,
      subject_name: row.get(2)?,
      started_at:   row.get(3)?,
      duration:     row.get(4)?,
    })
  };
  let raws = match subject {
    Some(id) => stmt
      .query_map(rusqlite::params![id.0], map_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?,
    None => stmt
      .query_map([], map_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?,
  };
  raws.into_iter().map(RawSession::into_session).collect()
}

// ─── StudyStore impl ─────────────────────────────────────────────────────────

impl StudyStore for SqliteStore {
  type Error = Error;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn upsert_subject(&self, draft: SubjectDraft) -> Result<Subject> {
    let draft_id = draft.subject_id.map(|id| id.0);
    let name = draft.name.clone();
    let goal_hours = draft.goal_hours;
    let palette_str = encode_palette(draft.palette)?;

    let id: i64 = self
      .conn
      .call(move |conn| match draft_id {
        Some(id) => {
          conn.execute(
            "INSERT INTO subjects (subject_id, name, goal_hours, palette)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(subject_id) DO UPDATE SET
               name       = excluded.name,
               goal_hours = excluded.goal_hours,
               palette    = excluded.palette",
            rusqlite::params![id, name, goal_hours, palette_str],
          )?;
          Ok(id)
        }
        None => {
          conn.execute(
            "INSERT INTO subjects (name, goal_hours, palette)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![name, goal_hours, palette_str],
          )?;
          Ok(conn.last_insert_rowid())
        }
      })
      .await?;

    self.bump(&[Table::Subjects]);
    Ok(Subject {
      subject_id: SubjectId(id),
      name:       draft.name,
      goal_hours: draft.goal_hours,
      palette:    draft.palette,
    })
  }

  async fn get_subject(&self, id: SubjectId) -> Result<Option<Subject>> {
    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT subject_id, name, goal_hours, palette
               FROM subjects WHERE subject_id = ?1",
              rusqlite::params![id.0],
              |row| {
                Ok(RawSubject {
                  subject_id: row.get(0)?,
                  name:       row.get(1)?,
                  goal_hours: row.get(2)?,
                  palette:    row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn delete_subject(&self, id: SubjectId) -> Result<bool> {
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subjects WHERE subject_id = ?1",
          rusqlite::params![id.0],
        )?)
      })
      .await?;

    if n > 0 {
      self.bump(&[Table::Subjects]);
    }
    Ok(n > 0)
  }

  async fn delete_subject_with_children(&self, id: SubjectId) -> Result<bool> {
    let (tasks, sessions, subjects) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let tasks = tx.execute(
          "DELETE FROM tasks WHERE subject_id = ?1",
          rusqlite::params![id.0],
        )?;
        let sessions = tx.execute(
          "DELETE FROM sessions WHERE subject_id = ?1",
          rusqlite::params![id.0],
        )?;
        let subjects = tx.execute(
          "DELETE FROM subjects WHERE subject_id = ?1",
          rusqlite::params![id.0],
        )?;
        tx.commit()?;
        Ok((tasks, sessions, subjects))
      })
      .await?;

    let mut touched = Vec::new();
    if tasks > 0 {
      touched.push(Table::Tasks);
    }
    if sessions > 0 {
      touched.push(Table::Sessions);
    }
    if subjects > 0 {
      touched.push(Table::Subjects);
    }
    if !touched.is_empty() {
      self.bump(&touched);
    }
    Ok(subjects > 0)
  }

  async fn watch_subjects(&self) -> Result<Live<Vec<Subject>>> {
    self.live(&[Table::Subjects], select_subjects).await
  }

  async fn watch_subject_count(&self) -> Result<Live<u64>> {
    self
      .live(&[Table::Subjects], |conn: &mut rusqlite::Connection| {
        let n: i64 =
          conn.query_row("SELECT COUNT(*) FROM subjects", [], |row| row.get(0))?;
        Ok(n as u64)
      })
      .await
  }

  async fn watch_total_goal_hours(&self) -> Result<Live<f64>> {
    self
      .live(&[Table::Subjects], |conn: &mut rusqlite::Connection| {
        Ok(conn.query_row(
          "SELECT COALESCE(SUM(goal_hours), 0.0) FROM subjects",
          [],
          |row| row.get(0),
        )?)
      })
      .await
  }

  // ── Tasks ─────────────────────────────────────────────────────────────────

  async fn upsert_task(&self, draft: TaskDraft) -> Result<Task> {
    let draft_id = draft.task_id.map(|id| id.0);
    let subject_id = draft.subject_id.0;
    let subject_name = draft.subject_name.clone();
    let title = draft.title.clone();
    let description = draft.description.clone();
    let due_str = encode_dt(draft.due_date);
    let priority = draft.priority.ordinal();
    let complete = draft.complete;

    let id: i64 = self
      .conn
      .call(move |conn| match draft_id {
        Some(id) => {
          conn.execute(
            "INSERT INTO tasks (task_id, subject_id, subject_name, title,
                                description, due_date, priority, complete)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(task_id) DO UPDATE SET
               subject_id   = excluded.subject_id,
               subject_name = excluded.subject_name,
               title        = excluded.title,
               description  = excluded.description,
               due_date     = excluded.due_date,
               priority     = excluded.priority,
               complete     = excluded.complete",
            rusqlite::params![
              id,
              subject_id,
              subject_name,
              title,
              description,
              due_str,
              priority,
              complete,
            ],
          )?;
          Ok(id)
        }
        None => {
          conn.execute(
            "INSERT INTO tasks (subject_id, subject_name, title, description,
                                due_date, priority, complete)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
              subject_id,
              subject_name,
              title,
              description,
              due_str,
              priority,
              complete,
            ],
          )?;
          Ok(conn.last_insert_rowid())
        }
      })
      .await?;

    self.bump(&[Table::Tasks]);
    Ok(Task {
      task_id:      TaskId(id),
      subject_id:   draft.subject_id,
      subject_name: draft.subject_name,
      title:        draft.title,
      description:  draft.description,
      due_date:     draft.due_date,
      priority:     draft.priority,
      complete:     draft.complete,
    })
  }

  async fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
    let raw: Option<RawTask> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT task_id, subject_id, subject_name, title, description,
                      due_date, priority, complete
               FROM tasks WHERE task_id = ?1",
              rusqlite::params![id.0],
              |row| {
                Ok(RawTask {
                  task_id:      row.get(0)?,
                  subject_id:   row.get(1)?,
                  subject_name: row.get(2)?,
                  title:        row.get(3)?,
                  description:  row.get(4)?,
                  due_date:     row.get(5)?,
                  priority:     row.get(6)?,
                  complete:     row.get(7)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTask::into_task).transpose()
  }

  async fn delete_task(&self, id: TaskId) -> Result<bool> {
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM tasks WHERE task_id = ?1",
          rusqlite::params![id.0],
        )?)
      })
      .await?;

    if n > 0 {
      self.bump(&[Table::Tasks]);
    }
    Ok(n > 0)
  }

  async fn delete_tasks_for_subject(&self, subject: SubjectId) -> Result<u64> {
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM tasks WHERE subject_id = ?1",
          rusqlite::params![subject.0],
        )?)
      })
      .await?;

    if n > 0 {
      self.bump(&[Table::Tasks]);
    }
    Ok(n as u64)
  }

  async fn watch_tasks(&self) -> Result<Live<Vec<Task>>> {
    self
      .live(&[Table::Tasks], |conn: &mut rusqlite::Connection| {
        select_tasks(conn, None)
      })
      .await
  }

  async fn watch_tasks_for_subject(
    &self,
    subject: SubjectId,
  ) -> Result<Live<Vec<Task>>> {
    self
      .live(&[Table::Tasks], move |conn: &mut rusqlite::Connection| {
        select_tasks(conn, Some(subject))
      })
      .await
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn insert_session(&self, draft: SessionDraft) -> Result<Session> {
    let subject_id = draft.subject_id.0;
    let subject_name = draft.subject_name.clone();
    let started_str = encode_dt(draft.started_at);
    let duration = draft.duration_secs;

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (subject_id, subject_name, started_at, duration)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![subject_id, subject_name, started_str, duration],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    self.bump(&[Table::Sessions]);
    Ok(Session {
      session_id:    SessionId(id),
      subject_id:    draft.subject_id,
      subject_name:  draft.subject_name,
      started_at:    draft.started_at,
      duration_secs: draft.duration_secs,
    })
  }

  async fn delete_session(&self, id: SessionId) -> Result<bool> {
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sessions WHERE session_id = ?1",
          rusqlite::params![id.0],
        )?)
      })
      .await?;

    if n > 0 {
      self.bump(&[Table::Sessions]);
    }
    Ok(n > 0)
  }

  async fn delete_sessions_for_subject(
    &self,
    subject: SubjectId,
  ) -> Result<u64> {
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sessions WHERE subject_id = ?1",
          rusqlite::params![subject.0],
        )?)
      })
      .await?;

    if n > 0 {
      self.bump(&[Table::Sessions]);
    }
    Ok(n as u64)
  }

  async fn watch_sessions(&self) -> Result<Live<Vec<Session>>> {
    self
      .live(&[Table::Sessions], |conn: &mut rusqlite::Connection| {
        select_sessions(conn, None)
      })
      .await
  }

  async fn watch_sessions_for_subject(
    &self,
    subject: SubjectId,
  ) -> Result<Live<Vec<Session>>> {
    self
      .live(&[Table::Sessions], move |conn: &mut rusqlite::Connection| {
        select_sessions(conn, Some(subject))
      })
      .await
  }

  async fn watch_total_session_secs(&self) -> Result<Live<i64>> {
    self
      .live(&[Table::Sessions], |conn: &mut rusqlite::Connection| {
        Ok(conn.query_row(
          "SELECT COALESCE(SUM(duration), 0) FROM sessions",
          [],
          |row| row.get(0),
        )?)
      })
      .await
  }

  async fn watch_session_secs_for_subject(
    &self,
    subject: SubjectId,
  ) -> Result<Live<i64>> {
    self
      .live(&[Table::Sessions], move |conn: &mut rusqlite::Connection| {
        Ok(conn.query_row(
          "SELECT COALESCE(SUM(duration), 0) FROM sessions
           WHERE subject_id = ?1",
          rusqlite::params![subject.0],
          |row| row.get(0),
        )?)
      })
      .await
  }
}
