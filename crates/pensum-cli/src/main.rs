//! `pensum` — drive the study tracker from the terminal.
//!
//! Opens the SQLite store named in the configuration and runs one command
//! through the same screens a UI host would, so validation, notices and
//! live aggregation behave identically everywhere.
//!
//! # Usage
//!
//! ```
//! pensum add-subject Maths --goal 10
//! pensum log-session --subject-id 1 --secs 3600
//! pensum dashboard
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::{Context as _, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use pensum_core::{
  live::Observer,
  session::Session,
  store::StudyStore as _,
  subject::{Palette, SubjectId, SubjectRef},
  task::{Priority, TaskId},
};
use pensum_screens::{
  MessageKind, Notice,
  dashboard::{Dashboard, DashboardCommand},
  session::{SessionCommand, SessionScreen},
  subject::{SubjectCommand, SubjectScreen},
  task::{TaskCommand, TaskEditor},
};
use pensum_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::{sync::mpsc::UnboundedReceiver, time::timeout};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "pensum", about = "Study tracker over a local SQLite store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "~/.config/pensum/config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Print the dashboard: subjects, the task agenda and recent sessions.
  Dashboard {
    /// Print the subject list as JSON instead of text.
    #[arg(long)]
    json: bool,
  },
  /// Create a subject.
  AddSubject {
    name: String,

    /// Study goal in hours.
    #[arg(long)]
    goal: String,

    /// Palette preset index.
    #[arg(long, default_value_t = 0)]
    palette: usize,
  },
  /// Record a finished study session.
  LogSession {
    #[arg(long)]
    subject_id: i64,

    /// Session length in seconds.
    #[arg(long)]
    secs: i64,
  },
  /// Create a task for a subject.
  AddTask {
    #[arg(long)]
    subject_id: i64,

    title: String,

    #[arg(long, default_value = "")]
    description: String,

    /// Due date as YYYY-MM-DD; stamped with the current time when omitted.
    #[arg(long)]
    due: Option<NaiveDate>,

    /// low, medium or high.
    #[arg(long, default_value = "medium")]
    priority: Priority,
  },
  /// Flip a task between upcoming and completed.
  CompleteTask {
    #[arg(long)]
    task_id: i64,
  },
  /// Delete a subject together with its tasks and sessions.
  DeleteSubject {
    #[arg(long)]
    subject_id: i64,
  },
  /// List recorded sessions, optionally for one subject.
  Sessions {
    #[arg(long)]
    subject_id: Option<i64>,

    #[arg(long)]
    json: bool,
  },
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from the TOML file layered with
/// `PENSUM_*` environment variables.
#[derive(Deserialize)]
struct CliConfig {
  /// SQLite database location; a leading `~` expands to `$HOME`.
  #[serde(default = "default_store_path")]
  store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
  PathBuf::from("~/.local/share/pensum/study.db")
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let config_path = expand_tilde(&cli.config);
  let settings = config::Config::builder()
    .add_source(config::File::from(config_path).required(false))
    .add_source(config::Environment::with_prefix("PENSUM"))
    .build()
    .context("failed to read configuration")?;
  let cfg: CliConfig = settings
    .try_deserialize()
    .context("failed to deserialise configuration")?;

  let store_path = expand_tilde(&cfg.store_path);
  if let Some(dir) = store_path.parent() {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("creating {}", dir.display()))?;
  }
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  match cli.command {
    Command::Dashboard { json } => show_dashboard(store, json).await,
    Command::AddSubject { name, goal, palette } => {
      add_subject(store, name, goal, palette).await
    }
    Command::LogSession { subject_id, secs } => {
      log_session(store, subject_id, secs).await
    }
    Command::AddTask { subject_id, title, description, due, priority } => {
      add_task(store, subject_id, title, description, due, priority).await
    }
    Command::CompleteTask { task_id } => complete_task(store, task_id).await,
    Command::DeleteSubject { subject_id } => {
      delete_subject(store, subject_id).await
    }
    Command::Sessions { subject_id, json } => {
      list_sessions(store, subject_id, json).await
    }
  }
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn show_dashboard(store: Arc<SqliteStore>, json: bool) -> Result<()> {
  let (dashboard, _notices) = Dashboard::new(store);
  let mut state = dashboard.state();
  let mut agenda = dashboard.upcoming_tasks();
  let mut recent = dashboard.recent_sessions();

  let snapshot = settled(&mut state).await;
  let tasks = settled(&mut agenda).await;
  let sessions = settled(&mut recent).await;

  if json {
    println!("{}", serde_json::to_string_pretty(&snapshot.subjects)?);
    return Ok(());
  }

  println!(
    "{} subjects, {} h goal, {} h studied",
    snapshot.subject_count,
    snapshot.total_goal_hours,
    snapshot.total_hours_studied
  );
  for subject in &snapshot.subjects {
    println!(
      "  [{}] {} ({} h goal)",
      subject.subject_id, subject.name, subject.goal_hours
    );
  }
  if !tasks.is_empty() {
    println!();
    println!("Upcoming tasks:");
    for task in &tasks {
      println!(
        "  [{}] {}  {:<6} {} ({})",
        task.task_id,
        task.due_date_label(),
        task.priority,
        task.title,
        task.subject_name
      );
    }
  }
  if !sessions.is_empty() {
    println!();
    println!("Recent sessions:");
    for session in &sessions {
      println!("  {}", session_line(session));
    }
  }
  Ok(())
}

async fn add_subject(
  store: Arc<SqliteStore>,
  name: String,
  goal: String,
  palette: usize,
) -> Result<()> {
  anyhow::ensure!(
    palette < Palette::PRESETS.len(),
    "palette index out of range (0..{})",
    Palette::PRESETS.len()
  );
  let (dashboard, mut notices) = Dashboard::new(store);
  dashboard.handle(DashboardCommand::SetSubjectName(name)).await;
  dashboard.handle(DashboardCommand::SetGoalHours(goal)).await;
  dashboard
    .handle(DashboardCommand::SetPalette(Palette::PRESETS[palette]))
    .await;
  dashboard.handle(DashboardCommand::SaveSubject).await;
  println!("{}", outcome(&mut notices).await?);
  Ok(())
}

async fn log_session(
  store: Arc<SqliteStore>,
  subject_id: i64,
  secs: i64,
) -> Result<()> {
  let id = SubjectId(subject_id);
  let subject = store
    .get_subject(id)
    .await?
    .with_context(|| format!("subject {id} not found"))?;

  let (screen, mut notices) = SessionScreen::new(store);
  screen
    .handle(SessionCommand::SelectSubject(SubjectRef::from(&subject)))
    .await;
  screen.handle(SessionCommand::SaveSession { duration_secs: secs }).await;
  println!("{}", outcome(&mut notices).await?);
  Ok(())
}

async fn add_task(
  store: Arc<SqliteStore>,
  subject_id: i64,
  title: String,
  description: String,
  due: Option<NaiveDate>,
  priority: Priority,
) -> Result<()> {
  let (editor, mut notices) =
    TaskEditor::open(store, None, Some(SubjectId(subject_id))).await?;
  editor.handle(TaskCommand::SetTitle(title)).await;
  if !description.is_empty() {
    editor.handle(TaskCommand::SetDescription(description)).await;
  }
  if let Some(due) = due {
    let midnight = due.and_hms_opt(0, 0, 0).context("invalid due date")?;
    editor
      .handle(TaskCommand::SetDueDate(Utc.from_utc_datetime(&midnight)))
      .await;
  }
  editor.handle(TaskCommand::SetPriority(priority)).await;
  editor.handle(TaskCommand::SaveTask).await;
  println!("{}", outcome(&mut notices).await?);
  Ok(())
}

async fn complete_task(store: Arc<SqliteStore>, task_id: i64) -> Result<()> {
  let id = TaskId(task_id);
  let task = store
    .get_task(id)
    .await?
    .with_context(|| format!("task {id} not found"))?;

  let (dashboard, mut notices) = Dashboard::new(store);
  dashboard.handle(DashboardCommand::ToggleTaskComplete(task)).await;
  println!("{}", outcome(&mut notices).await?);
  Ok(())
}

async fn delete_subject(
  store: Arc<SqliteStore>,
  subject_id: i64,
) -> Result<()> {
  let (screen, mut notices) =
    SubjectScreen::open(store, SubjectId(subject_id)).await?;
  screen.handle(SubjectCommand::DeleteSubject).await;
  println!("{}", outcome(&mut notices).await?);
  Ok(())
}

async fn list_sessions(
  store: Arc<SqliteStore>,
  subject_id: Option<i64>,
  json: bool,
) -> Result<()> {
  let (screen, _notices) = SessionScreen::new(store);
  let mut state = screen.state();
  let snapshot = settled(&mut state).await;

  let filter = subject_id.map(SubjectId);
  let sessions: Vec<&Session> = snapshot
    .sessions
    .iter()
    .filter(|s| filter.is_none_or(|id| s.subject_id == id))
    .collect();

  if json {
    println!("{}", serde_json::to_string_pretty(&sessions)?);
    return Ok(());
  }
  if sessions.is_empty() {
    println!("No sessions recorded.");
    return Ok(());
  }
  for session in sessions {
    println!("{}", session_line(session));
  }
  Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn session_line(session: &Session) -> String {
  format!(
    "[{}] {}  {:>4} min  {}",
    session.session_id,
    session.date_label(),
    session.duration_secs / 60,
    session.subject_name
  )
}

/// Drain emissions until the pipeline goes quiet for a beat, then return
/// the latest value. Good enough for a one-shot inspection command.
async fn settled<T: Clone + Send + Sync + 'static>(
  observer: &mut Observer<T>,
) -> T {
  loop {
    match timeout(Duration::from_millis(200), observer.changed()).await {
      Ok(true) => continue,
      Ok(false) | Err(_) => break,
    }
  }
  observer.get()
}

/// Wait for a command's outcome notice. An info message is the success
/// path; an error notice fails the command.
async fn outcome(notices: &mut UnboundedReceiver<Notice>) -> Result<String> {
  let notice = timeout(Duration::from_secs(5), notices.recv())
    .await
    .context("timed out waiting for the screen to answer")?
    .context("screen closed its notice channel")?;
  match notice {
    Notice::Message { text, kind: MessageKind::Info } => Ok(text),
    Notice::Message { text, kind: MessageKind::Error } => anyhow::bail!(text),
    Notice::NavigateUp => anyhow::bail!("screen navigated away unexpectedly"),
  }
}

/// Expand a leading `~/` using `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
