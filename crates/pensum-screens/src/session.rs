//! Session recorder — pick a subject, log a timed session against it, and
//! review or delete past sessions.
//!
//! Timing itself happens in the host; this screen receives the finished
//! duration and owns validation, attribution and history.

use std::sync::Arc;

use chrono::Utc;
use pensum_core::{
  live::{self, Live, Observer, SharedLive},
  session::{Session, SessionDraft},
  store::StudyStore,
  subject::{Subject, SubjectRef},
  validate,
};
use tokio::sync::{mpsc, watch};

use crate::{
  STATE_GRACE,
  notice::{self, Notice, NoticeSender},
  repo::{SessionRepository, SubjectRepository},
};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Everything the session screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
  /// Subjects offered for attribution.
  pub subjects:       Vec<Subject>,
  /// Full session history, most recent first.
  pub sessions:       Vec<Session>,
  /// Subject the next saved session will be attributed to.
  pub selected:       Option<SubjectRef>,
  pub pending_delete: Option<Session>,
}

#[derive(Debug, Clone, PartialEq)]
struct Form {
  selected:       Option<SubjectRef>,
  pending_delete: Option<Session>,
}

// ─── Commands ────────────────────────────────────────────────────────────────

/// User intents the session screen accepts.
#[derive(Debug, Clone)]
pub enum SessionCommand {
  /// Choose the subject the next session belongs to.
  SelectSubject(SubjectRef),
  /// Nudge the user if no subject is selected yet, e.g. before the timer
  /// is allowed to start.
  RequireSubject,
  /// Persist a finished session of `duration_secs`, stamped with the
  /// current time.
  SaveSession { duration_secs: i64 },
  StageSessionForDelete(Session),
  DeleteSession,
}

// ─── Screen ──────────────────────────────────────────────────────────────────

pub struct SessionScreen<S: StudyStore + 'static> {
  sessions:  SessionRepository<S>,
  form:      watch::Sender<Form>,
  form_live: Live<Form>,
  state:     SharedLive<SessionSnapshot>,
  notices:   NoticeSender,
}

impl<S: StudyStore + 'static> SessionScreen<S> {
  pub fn new(store: Arc<S>) -> (Self, mpsc::UnboundedReceiver<Notice>) {
    let subjects = SubjectRepository::new(Arc::clone(&store));
    let sessions = SessionRepository::new(store);
    let (form, form_live) =
      live::channel(Form { selected: None, pending_delete: None });
    let (notices, notice_rx) = notice::channel();

    let state = SharedLive::new(
      SessionSnapshot {
        subjects:       Vec::new(),
        sessions:       Vec::new(),
        selected:       None,
        pending_delete: None,
      },
      STATE_GRACE,
      {
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
                tracing::warn!(error = %e, "session pipeline failed to start");
              }
            }
          }
        }
      },
    );

    let screen = SessionScreen { sessions, form, form_live, state, notices };
    (screen, notice_rx)
  }

  pub fn state(&self) -> Observer<SessionSnapshot> {
    self.state.watch()
  }

  pub async fn handle(&self, command: SessionCommand) {
    match command {
      SessionCommand::SelectSubject(subject) => {
        self.form.send_modify(|f| f.selected = Some(subject));
      }
      SessionCommand::RequireSubject => self.require_subject(),
      SessionCommand::SaveSession { duration_secs } => {
        self.save_session(duration_secs).await;
      }
      SessionCommand::StageSessionForDelete(session) => {
        self.form.send_modify(|f| f.pending_delete = Some(session));
      }
      SessionCommand::DeleteSession => self.delete_session().await,
    }
  }

  fn require_subject(&self) {
    if let Err(e) = validate::selected_subject(self.form_live.get().selected) {
      self.notices.send(Notice::error(e.to_string()));
    }
  }

  async fn save_session(&self, duration_secs: i64) {
    let duration_secs = match validate::session_duration(duration_secs) {
      Ok(secs) => secs,
      Err(e) => {
        self.notices.send(Notice::error(e.to_string()));
        return;
      }
    };
    let selected =
      match validate::selected_subject(self.form_live.get().selected) {
        Ok(selected) => selected,
        Err(e) => {
          self.notices.send(Notice::error(e.to_string()));
          return;
        }
      };
    let draft = SessionDraft {
      subject_id:    selected.subject_id,
      subject_name:  selected.name,
      started_at:    Utc::now(),
      duration_secs,
    };
    match self.sessions.insert(draft).await {
      Ok(_) => self.notices.send(Notice::info("Session saved")),
      Err(e) => {
        tracing::warn!(error = %e, "saving session failed");
        self.notices.send(Notice::error(format!("Couldn't save session: {e}")));
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

async fn merged_state<S: StudyStore + 'static>(
  subjects: SubjectRepository<S>,
  sessions: SessionRepository<S>,
  form: Live<Form>,
) -> Result<Live<SessionSnapshot>, S::Error> {
  let listed = subjects.subjects().await?;
  let history = sessions.all().await?;
  Ok(live::combine3(form, listed, history, |form, listed, history| {
    SessionSnapshot {
      subjects:       listed.clone(),
      sessions:       history.clone(),
      selected:       form.selected.clone(),
      pending_delete: form.pending_delete.clone(),
    }
  }))
}
