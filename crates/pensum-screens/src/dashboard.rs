//! Dashboard — the landing screen: the subject grid with aggregate study
//! figures, the task agenda across every subject, and the most recent
//! sessions.

use std::sync::Arc;

use pensum_core::{
  live::{self, Live, Observer, SharedLive},
  progress,
  session::Session,
  store::StudyStore,
  subject::{Palette, Subject},
  task::Task,
  validate,
};
use tokio::sync::{mpsc, watch};

use crate::{
  STATE_GRACE,
  notice::{self, Notice, NoticeSender},
  repo::{SessionRepository, SubjectRepository, TaskRepository},
};

/// Gradient preselected when the "new subject" form opens.
const DEFAULT_PALETTE: Palette = Palette::CORAL_TO_GREY;

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Everything the dashboard renders, merged from the live store queries and
/// the in-progress "new subject" form.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
  pub subject_count:       u64,
  pub total_goal_hours:    f64,
  /// Hours studied across every subject, rounded to two decimals.
  pub total_hours_studied: f64,
  pub subjects:            Vec<Subject>,
  /// "New subject" form fields, echoed back exactly as typed.
  pub subject_name:        String,
  pub goal_hours_input:    String,
  pub palette:             Palette,
  /// Session staged for deletion behind a confirm dialog, if any.
  pub pending_delete:      Option<Session>,
}

/// Locally edited state merged into every snapshot.
#[derive(Debug, Clone, PartialEq)]
struct Form {
  subject_name:     String,
  goal_hours_input: String,
  palette:          Palette,
  pending_delete:   Option<Session>,
}

impl Form {
  fn blank() -> Self {
    Self {
      subject_name:     String::new(),
      goal_hours_input: String::new(),
      palette:          DEFAULT_PALETTE,
      pending_delete:   None,
    }
  }
}

// ─── Commands ────────────────────────────────────────────────────────────────

/// User intents the dashboard accepts.
#[derive(Debug, Clone)]
pub enum DashboardCommand {
  SetSubjectName(String),
  SetGoalHours(String),
  SetPalette(Palette),
  /// Validate the form and persist a new subject.
  SaveSubject,
  /// Flip a task's completion flag, keeping every other field.
  ToggleTaskComplete(Task),
  /// Stage a session for deletion; [`DashboardCommand::DeleteSession`]
  /// confirms it.
  StageSessionForDelete(Session),
  DeleteSession,
}

// ─── Screen ──────────────────────────────────────────────────────────────────

pub struct Dashboard<S: StudyStore + 'static> {
  subjects:  SubjectRepository<S>,
  tasks:     TaskRepository<S>,
  sessions:  SessionRepository<S>,
  form:      watch::Sender<Form>,
  form_live: Live<Form>,
  state:     SharedLive<DashboardSnapshot>,
  upcoming:  SharedLive<Vec<Task>>,
  recent:    SharedLive<Vec<Session>>,
  notices:   NoticeSender,
}

impl<S: StudyStore + 'static> Dashboard<S> {
  pub fn new(store: Arc<S>) -> (Self, mpsc::UnboundedReceiver<Notice>) {
    let subjects = SubjectRepository::new(Arc::clone(&store));
    let tasks = TaskRepository::new(Arc::clone(&store));
    let sessions = SessionRepository::new(store);
    let (form, form_live) = live::channel(Form::blank());
    let (notices, notice_rx) = notice::channel();

    let state = SharedLive::new(
      DashboardSnapshot {
        subject_count:       0,
        total_goal_hours:    0.0,
        total_hours_studied: 0.0,
        subjects:            Vec::new(),
        subject_name:        String::new(),
        goal_hours_input:    String::new(),
        palette:             DEFAULT_PALETTE,
        pending_delete:      None,
      },
      STATE_GRACE,
      {
        let subjects = subjects.clone();
        let sessions = sessions.clone();
        let form = form_live.clone();
        move |tx| {
          let subjects = subjects.clone();
          let sessions = sessions.clone();
          let form = form.clone();
          async move {
            match merged_state(subjects, sessions, form).await {
              Ok(merged) => live::forward(merged, tx).await,
              Err(e) => {
                tracing::warn!(error = %e, "dashboard pipeline failed to start");
              }
            }
          }
        }
      },
    );

    let upcoming = SharedLive::new(Vec::new(), STATE_GRACE, {
      let tasks = tasks.clone();
      move |tx| {
        let tasks = tasks.clone();
        async move {
          match tasks.upcoming().await {
            Ok(agenda) => live::forward(agenda, tx).await,
            Err(e) => {
              tracing::warn!(error = %e, "task agenda failed to start");
            }
          }
        }
      }
    });

    let recent = SharedLive::new(Vec::new(), STATE_GRACE, {
      let sessions = sessions.clone();
      move |tx| {
        let sessions = sessions.clone();
        async move {
          match sessions.recent_five().await {
            Ok(latest) => live::forward(latest, tx).await,
            Err(e) => {
              tracing::warn!(error = %e, "session feed failed to start");
            }
          }
        }
      }
    });

    let dashboard = Dashboard {
      subjects,
      tasks,
      sessions,
      form,
      form_live,
      state,
      upcoming,
      recent,
      notices,
    };
    (dashboard, notice_rx)
  }

  /// Live dashboard state. The pipeline behind it runs while at least one
  /// observer exists, plus the grace window.
  pub fn state(&self) -> Observer<DashboardSnapshot> {
    self.state.watch()
  }

  /// Incomplete tasks across every subject, in agenda order.
  pub fn upcoming_tasks(&self) -> Observer<Vec<Task>> {
    self.upcoming.watch()
  }

  /// The five most recent sessions.
  pub fn recent_sessions(&self) -> Observer<Vec<Session>> {
    self.recent.watch()
  }

  pub async fn handle(&self, command: DashboardCommand) {
    match command {
      DashboardCommand::SetSubjectName(name) => {
        self.form.send_modify(|f| f.subject_name = name);
      }
      DashboardCommand::SetGoalHours(input) => {
        self.form.send_modify(|f| f.goal_hours_input = input);
      }
      DashboardCommand::SetPalette(palette) => {
        self.form.send_modify(|f| f.palette = palette);
      }
      DashboardCommand::SaveSubject => self.save_subject().await,
      DashboardCommand::ToggleTaskComplete(task) => {
        self.toggle_task(task).await;
      }
      DashboardCommand::StageSessionForDelete(session) => {
        self.form.send_modify(|f| f.pending_delete = Some(session));
      }
      DashboardCommand::DeleteSession => self.delete_session().await,
    }
  }

  /// On success the form resets for the next entry; on a validation failure
  /// the typed input stays put so the user can correct it.
  async fn save_subject(&self) {
    let form = self.form_live.get();
    let draft = match validate::subject_draft(
      None,
      &form.subject_name,
      &form.goal_hours_input,
      form.palette,
    ) {
      Ok(draft) => draft,
      Err(e) => {
        self.notices.send(Notice::error(e.to_string()));
        return;
      }
    };
    match self.subjects.upsert(draft).await {
      Ok(_) => {
        self.form.send_modify(|f| *f = Form::blank());
        self.notices.send(Notice::info("Subject saved"));
      }
      Err(e) => {
        tracing::warn!(error = %e, "saving subject failed");
        self.notices.send(Notice::error(format!("Couldn't save subject: {e}")));
      }
    }
  }

  async fn toggle_task(&self, task: Task) {
    let was_complete = task.complete;
    match self.tasks.upsert(task.toggled()).await {
      Ok(_) => {
        let text = if was_complete {
          "Task moved back to upcoming"
        } else {
          "Task completed"
        };
        self.notices.send(Notice::info(text));
      }
      Err(e) => {
        tracing::warn!(error = %e, "updating task failed");
        self.notices.send(Notice::error(format!("Couldn't update task: {e}")));
      }
    }
  }

  async fn delete_session(&self) {
    // Nothing staged means no confirm dialog was shown; stay quiet.
    let Some(session) = self.form_live.get().pending_delete else {
      return;
    };
    match self.sessions.delete(session.session_id).await {
      Ok(matched) => {
        self.form.send_modify(|f| f.pending_delete = None);
        if matched {
          self.notices.send(Notice::info("Session deleted"));
        } else {
          self.notices.send(Notice::error("No session found"));
        }
      }
      Err(e) => {
        tracing::warn!(error = %e, "deleting session failed");
        self
          .notices
          .send(Notice::error(format!("Couldn't delete session: {e}")));
      }
    }
  }
}

async fn merged_state<S: StudyStore + 'static>(
  subjects: SubjectRepository<S>,
  sessions: SessionRepository<S>,
  form: Live<Form>,
) -> Result<Live<DashboardSnapshot>, S::Error> {
  let count = subjects.count().await?;
  let goal_hours = subjects.total_goal_hours().await?;
  let listed = subjects.subjects().await?;
  let total_secs = sessions.total_secs().await?;
  Ok(live::combine5(
    form,
    count,
    goal_hours,
    listed,
    total_secs,
    |form, count, goal_hours, listed, total_secs| DashboardSnapshot {
      subject_count:       *count,
      total_goal_hours:    *goal_hours,
      total_hours_studied: progress::hours_studied(*total_secs),
      subjects:            listed.clone(),
      subject_name:        form.subject_name.clone(),
      goal_hours_input:    form.goal_hours_input.clone(),
      palette:             form.palette,
      pending_delete:      form.pending_delete.clone(),
    },
  ))
}
