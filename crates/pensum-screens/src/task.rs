//! Task editor — create a task for a subject or edit a stored one, flip
//! its completion, or delete it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pensum_core::{
  live::{self, Live, Observer, SharedLive},
  store::StudyStore,
  subject::{Subject, SubjectId, SubjectRef},
  task::{Priority, TaskDraft, TaskId},
  validate,
};
use tokio::sync::{mpsc, watch};

use crate::{
  Error, Result, STATE_GRACE,
  notice::{self, Notice, NoticeSender},
  repo::{SubjectRepository, TaskRepository},
};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Everything the task editor renders: the form plus the subjects offered
/// by the "related subject" picker.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEditorSnapshot {
  pub subjects:    Vec<Subject>,
  /// `Some` when editing a stored task, `None` when composing a new one.
  pub task_id:     Option<TaskId>,
  pub title:       String,
  pub description: String,
  /// Unset means "due when saved"; the save path stamps the current time.
  pub due_date:    Option<DateTime<Utc>>,
  pub priority:    Priority,
  pub complete:    bool,
  pub related:     Option<SubjectRef>,
}

#[derive(Debug, Clone, PartialEq)]
struct Form {
  task_id:     Option<TaskId>,
  title:       String,
  description: String,
  due_date:    Option<DateTime<Utc>>,
  priority:    Priority,
  complete:    bool,
  related:     Option<SubjectRef>,
}

impl Form {
  fn blank() -> Self {
    Self {
      task_id:     None,
      title:       String::new(),
      description: String::new(),
      due_date:    None,
      priority:    Priority::default(),
      complete:    false,
      related:     None,
    }
  }
}

// ─── Commands ────────────────────────────────────────────────────────────────

/// User intents the task editor accepts.
#[derive(Debug, Clone)]
pub enum TaskCommand {
  SetTitle(String),
  SetDescription(String),
  SetDueDate(DateTime<Utc>),
  SetPriority(Priority),
  /// Bind the task to a subject from the picker.
  SelectSubject(SubjectRef),
  /// Flip the form's completion flag; persisted on save.
  ToggleComplete,
  /// Validate, persist, then ask the host to navigate up.
  SaveTask,
  /// Delete the stored task, then ask the host to navigate up.
  DeleteTask,
}

// ─── Screen ──────────────────────────────────────────────────────────────────

pub struct TaskEditor<S: StudyStore + 'static> {
  tasks:     TaskRepository<S>,
  form:      watch::Sender<Form>,
  form_live: Live<Form>,
  state:     SharedLive<TaskEditorSnapshot>,
  notices:   NoticeSender,
}

impl<S: StudyStore + 'static> TaskEditor<S> {
  /// Open the editor. With a task id the form is seeded from the stored
  /// task; with only a subject id it is a blank form already bound to that
  /// subject.
  pub async fn open(
    store: Arc<S>,
    task: Option<TaskId>,
    subject: Option<SubjectId>,
  ) -> Result<(Self, mpsc::UnboundedReceiver<Notice>)> {
    let subjects = SubjectRepository::new(Arc::clone(&store));
    let tasks = TaskRepository::new(store);

    let seed = match (task, subject) {
      (Some(task_id), _) => {
        let stored = tasks
          .get(task_id)
          .await
          .map_err(Error::store)?
          .ok_or(Error::TaskNotFound(task_id))?;
        Form {
          task_id:     Some(stored.task_id),
          title:       stored.title,
          description: stored.description,
          due_date:    Some(stored.due_date),
          priority:    stored.priority,
          complete:    stored.complete,
          related:     Some(SubjectRef {
            subject_id: stored.subject_id,
            name:       stored.subject_name,
          }),
        }
      }
      (None, Some(subject_id)) => {
        let stored = subjects
          .get(subject_id)
          .await
          .map_err(Error::store)?
          .ok_or(Error::SubjectNotFound(subject_id))?;
        Form { related: Some(SubjectRef::from(&stored)), ..Form::blank() }
      }
      (None, None) => Form::blank(),
    };

    let (form, form_live) = live::channel(seed.clone());
    let (notices, notice_rx) = notice::channel();

    let state = SharedLive::new(
      TaskEditorSnapshot {
        subjects:    Vec::new(),
        task_id:     seed.task_id,
        title:       seed.title,
        description: seed.description,
        due_date:    seed.due_date,
        priority:    seed.priority,
        complete:    seed.complete,
        related:     seed.related,
      },
      STATE_GRACE,
      {
        let form = form_live.clone();
        move |tx| {
          let subjects = subjects.clone();
          let form = form.clone();
          async move {
            match merged_state(subjects, form).await {
              Ok(merged) => live::forward(merged, tx).await,
              Err(e) => {
                tracing::warn!(error = %e, "task editor pipeline failed to start");
              }
            }
          }
        }
      },
    );

    let editor = TaskEditor { tasks, form, form_live, state, notices };
    Ok((editor, notice_rx))
  }

  pub fn state(&self) -> Observer<TaskEditorSnapshot> {
    self.state.watch()
  }

  pub async fn handle(&self, command: TaskCommand) {
    match command {
      TaskCommand::SetTitle(title) => {
        self.form.send_modify(|f| f.title = title);
      }
      TaskCommand::SetDescription(description) => {
        self.form.send_modify(|f| f.description = description);
      }
      TaskCommand::SetDueDate(due_date) => {
        self.form.send_modify(|f| f.due_date = Some(due_date));
      }
      TaskCommand::SetPriority(priority) => {
        self.form.send_modify(|f| f.priority = priority);
      }
      TaskCommand::SelectSubject(subject) => {
        self.form.send_modify(|f| f.related = Some(subject));
      }
      TaskCommand::ToggleComplete => {
        self.form.send_modify(|f| f.complete = !f.complete);
      }
      TaskCommand::SaveTask => self.save_task().await,
      TaskCommand::DeleteTask => self.delete_task().await,
    }
  }

  async fn save_task(&self) {
    let form = self.form_live.get();
    let related = match validate::selected_subject(form.related) {
      Ok(related) => related,
      Err(e) => {
        self.notices.send(Notice::error(e.to_string()));
        return;
      }
    };
    let draft = TaskDraft {
      task_id:      form.task_id,
      subject_id:   related.subject_id,
      subject_name: related.name,
      title:        form.title,
      description:  form.description,
      due_date:     form.due_date.unwrap_or_else(Utc::now),
      priority:     form.priority,
      complete:     form.complete,
    };
    match self.tasks.upsert(draft).await {
      Ok(_) => {
        self.notices.send(Notice::info("Task saved"));
        self.notices.send(Notice::NavigateUp);
      }
      Err(e) => {
        tracing::warn!(error = %e, "saving task failed");
        self.notices.send(Notice::error(format!("Couldn't save task: {e}")));
      }
    }
  }

  async fn delete_task(&self) {
    let Some(task_id) = self.form_live.get().task_id else {
      self.notices.send(Notice::error("No task found"));
      return;
    };
    match self.tasks.delete(task_id).await {
      Ok(true) => {
        self.notices.send(Notice::info("Task deleted"));
        self.notices.send(Notice::NavigateUp);
      }
      Ok(false) => self.notices.send(Notice::error("No task found")),
      Err(e) => {
        tracing::warn!(error = %e, "deleting task failed");
        self.notices.send(Notice::error(format!("Couldn't delete task: {e}")));
      }
    }
  }
}

async fn merged_state<S: StudyStore + 'static>(
  subjects: SubjectRepository<S>,
  form: Live<Form>,
) -> Result<Live<TaskEditorSnapshot>, S::Error> {
  let listed = subjects.subjects().await?;
  Ok(live::combine2(form, listed, |form, listed| TaskEditorSnapshot {
    subjects:    listed.clone(),
    task_id:     form.task_id,
    title:       form.title.clone(),
    description: form.description.clone(),
    due_date:    form.due_date,
    priority:    form.priority,
    complete:    form.complete,
    related:     form.related.clone(),
  }))
}
