//! Subject detail — per-subject hours and goal progress, the task lists
//! split by completion, recent sessions, and the edit and delete flows.

use std::sync::Arc;

use pensum_core::{
  live::{self, Live, Observer, SharedLive},
  progress,
  session::Session,
  store::StudyStore,
  subject::{Palette, Subject, SubjectId},
  task::Task,
  validate,
};
use tokio::sync::{mpsc, watch};

use crate::{
  Error, Result, STATE_GRACE,
  notice::{self, Notice, NoticeSender},
  repo::{SessionRepository, SubjectRepository, TaskRepository},
};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Everything the subject screen renders.
///
/// The progress figures are derived from the edit form's goal input, not
/// the stored goal, so the ring updates while the user is still typing.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectSnapshot {
  pub subject_id:       SubjectId,
  /// Edit form fields, seeded from the stored subject.
  pub subject_name:     String,
  pub goal_hours_input: String,
  pub palette:          Palette,
  /// Hours studied for this subject, rounded to two decimals.
  pub hours_studied:    f64,
  /// Fraction of the goal reached, in `[0, 1]`.
  pub progress:         f64,
  pub upcoming_tasks:   Vec<Task>,
  pub completed_tasks:  Vec<Task>,
  pub recent_sessions:  Vec<Session>,
  pub pending_delete:   Option<Session>,
}

impl SubjectSnapshot {
  /// Display percentage for the progress ring.
  pub fn percent(&self) -> u8 {
    progress::percent(self.progress)
  }
}

#[derive(Debug, Clone, PartialEq)]
struct Form {
  subject_name:     String,
  goal_hours_input: String,
  palette:          Palette,
  pending_delete:   Option<Session>,
}

// ─── Commands ────────────────────────────────────────────────────────────────

/// User intents the subject screen accepts.
#[derive(Debug, Clone)]
pub enum SubjectCommand {
  SetSubjectName(String),
  SetGoalHours(String),
  SetPalette(Palette),
  /// Validate the form and persist it over the stored subject.
  UpdateSubject,
  /// Remove the subject with all of its tasks and sessions, then ask the
  /// host to navigate up.
  DeleteSubject,
  ToggleTaskComplete(Task),
  StageSessionForDelete(Session),
  DeleteSession,
}

// ─── Screen ──────────────────────────────────────────────────────────────────

pub struct SubjectScreen<S: StudyStore + 'static> {
  subject_id: SubjectId,
  subjects:   SubjectRepository<S>,
  tasks:      TaskRepository<S>,
  sessions:   SessionRepository<S>,
  form:       watch::Sender<Form>,
  form_live:  Live<Form>,
  state:      SharedLive<SubjectSnapshot>,
  notices:    NoticeSender,
}

impl<S: StudyStore + 'static> SubjectScreen<S> {
  /// Open the screen for `id`, seeding the edit form from the stored
  /// subject. Fails with [`Error::SubjectNotFound`] when it does not exist.
  pub async fn open(
    store: Arc<S>,
    id: SubjectId,
  ) -> Result<(Self, mpsc::UnboundedReceiver<Notice>)> {
    let subjects = SubjectRepository::new(Arc::clone(&store));
    let tasks = TaskRepository::new(Arc::clone(&store));
    let sessions = SessionRepository::new(store);

    let subject = subjects
      .get(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SubjectNotFound(id))?;

    let (form, form_live) = live::channel(Form {
      subject_name:     subject.name.clone(),
      goal_hours_input: goal_input(subject.goal_hours),
      palette:          subject.palette,
      pending_delete:   None,
    });
    let (notices, notice_rx) = notice::channel();

    let state = SharedLive::new(initial_snapshot(id, &subject), STATE_GRACE, {
      let tasks = tasks.clone();
      let sessions = sessions.clone();
      let form = form_live.clone();
      move |tx| {
        let tasks = tasks.clone();
        let sessions = sessions.clone();
        let form = form.clone();
        async move {
          match merged_state(id, tasks, sessions, form).await {
            Ok(merged) => live::forward(merged, tx).await,
            Err(e) => {
              tracing::warn!(error = %e, "subject pipeline failed to start");
            }
          }
        }
      }
    });

    let screen = SubjectScreen {
      subject_id: id,
      subjects,
      tasks,
      sessions,
      form,
      form_live,
      state,
      notices,
    };
    Ok((screen, notice_rx))
  }

  pub fn subject_id(&self) -> SubjectId {
    self.subject_id
  }

  pub fn state(&self) -> Observer<SubjectSnapshot> {
    self.state.watch()
  }

  pub async fn handle(&self, command: SubjectCommand) {
    match command {
      SubjectCommand::SetSubjectName(name) => {
        self.form.send_modify(|f| f.subject_name = name);
      }
      SubjectCommand::SetGoalHours(input) => {
        self.form.send_modify(|f| f.goal_hours_input = input);
      }
      SubjectCommand::SetPalette(palette) => {
        self.form.send_modify(|f| f.palette = palette);
      }
      SubjectCommand::UpdateSubject => self.update_subject().await,
      SubjectCommand::DeleteSubject => self.delete_subject().await,
      SubjectCommand::ToggleTaskComplete(task) => self.toggle_task(task).await,
      SubjectCommand::StageSessionForDelete(session) => {
        self.form.send_modify(|f| f.pending_delete = Some(session));
      }
      SubjectCommand::DeleteSession => self.delete_session().await,
    }
  }

  async fn update_subject(&self) {
    let form = self.form_live.get();
    let draft = match validate::subject_draft(
      Some(self.subject_id),
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
      Ok(_) => self.notices.send(Notice::info("Subject updated")),
      Err(e) => {
        tracing::warn!(error = %e, "updating subject failed");
        self
          .notices
          .send(Notice::error(format!("Couldn't update subject: {e}")));
      }
    }
  }

  async fn delete_subject(&self) {
    match self.subjects.delete(self.subject_id).await {
      Ok(true) => {
        self.notices.send(Notice::info("Subject deleted"));
        self.notices.send(Notice::NavigateUp);
      }
      // The row vanished under us, e.g. deleted from another screen.
      Ok(false) => self.notices.send(Notice::error("No subject found")),
      Err(e) => {
        tracing::warn!(error = %e, "deleting subject failed");
        self
          .notices
          .send(Notice::error(format!("Couldn't delete subject: {e}")));
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

fn initial_snapshot(id: SubjectId, subject: &Subject) -> SubjectSnapshot {
  SubjectSnapshot {
    subject_id:       id,
    subject_name:     subject.name.clone(),
    goal_hours_input: goal_input(subject.goal_hours),
    palette:          subject.palette,
    hours_studied:    0.0,
    progress:         0.0,
    upcoming_tasks:   Vec::new(),
    completed_tasks:  Vec::new(),
    recent_sessions:  Vec::new(),
    pending_delete:   None,
  }
}

/// Seed the goal input with the shortest decimal form, `10` rather than
/// `10.0`.
fn goal_input(goal_hours: f64) -> String {
  format!("{goal_hours}")
}

async fn merged_state<S: StudyStore + 'static>(
  id: SubjectId,
  tasks: TaskRepository<S>,
  sessions: SessionRepository<S>,
  form: Live<Form>,
) -> Result<Live<SubjectSnapshot>, S::Error> {
  let upcoming = tasks.upcoming_for_subject(id).await?;
  let completed = tasks.completed_for_subject(id).await?;
  let recent = sessions.recent_ten_for_subject(id).await?;
  let secs = sessions.secs_for_subject(id).await?;
  Ok(live::combine5(
    form,
    upcoming,
    completed,
    recent,
    secs,
    move |form, upcoming, completed, recent, secs| {
      let hours = progress::hours_studied(*secs);
      let goal = progress::goal_from_input(&form.goal_hours_input);
      SubjectSnapshot {
        subject_id:       id,
        subject_name:     form.subject_name.clone(),
        goal_hours_input: form.goal_hours_input.clone(),
        palette:          form.palette,
        hours_studied:    hours,
        progress:         progress::goal_fraction(hours, goal),
        upcoming_tasks:   upcoming.clone(),
        completed_tasks:  completed.clone(),
        recent_sessions:  recent.clone(),
        pending_delete:   form.pending_delete.clone(),
      }
    },
  ))
}
