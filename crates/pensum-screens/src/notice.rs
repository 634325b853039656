//! One-shot notices emitted by command handlers.
//!
//! A notice is delivered to the host at most once and is never folded into
//! screen state, so a snackbar shown for it cannot reappear after a
//! re-render or a configuration change.

use tokio::sync::mpsc;

/// Severity of a [`Notice::Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
  Info,
  Error,
}

/// Fire-and-forget feedback from a command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
  /// A transient, user-visible message.
  Message { text: String, kind: MessageKind },
  /// The screen asks its host to navigate back to the previous screen.
  NavigateUp,
}

impl Notice {
  pub fn info(text: impl Into<String>) -> Self {
    Notice::Message { text: text.into(), kind: MessageKind::Info }
  }

  pub fn error(text: impl Into<String>) -> Self {
    Notice::Message { text: text.into(), kind: MessageKind::Error }
  }
}

/// Create the notice channel a screen publishes into. The receiver goes to
/// the host; once it is dropped, further sends become no-ops.
pub(crate) fn channel() -> (NoticeSender, mpsc::UnboundedReceiver<Notice>) {
  let (tx, rx) = mpsc::unbounded_channel();
  (NoticeSender(tx), rx)
}

/// Sender half that swallows "receiver gone" errors. A screen outliving its
/// host is not a fault worth propagating.
#[derive(Debug, Clone)]
pub(crate) struct NoticeSender(mpsc::UnboundedSender<Notice>);

impl NoticeSender {
  pub(crate) fn send(&self, notice: Notice) {
    let _ = self.0.send(notice);
  }
}
