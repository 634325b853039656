//! Error types for `pensum-core`.
//!
//! These are the domain-rule failures surfaced to users verbatim, so the
//! messages are written as user-facing copy rather than debug strings.

use thiserror::Error;

use crate::{
  session::MIN_SESSION_SECS,
  validate::{MAX_GOAL_HOURS, MAX_NAME_CHARS, MIN_GOAL_HOURS, MIN_NAME_CHARS},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
  #[error("enter a subject name")]
  NameBlank,

  #[error("subject name is too short (minimum {} characters)", MIN_NAME_CHARS)]
  NameTooShort,

  #[error("subject name is too long (maximum {} characters)", MAX_NAME_CHARS)]
  NameTooLong,

  #[error("enter a study hours goal")]
  GoalBlank,

  #[error("study hours goal is not a valid number")]
  GoalNotANumber,

  #[error("set a goal of at least {} hour", MIN_GOAL_HOURS)]
  GoalTooLow,

  #[error("set a goal of at most {} hours", MAX_GOAL_HOURS)]
  GoalTooHigh,

  #[error("a session cannot be shorter than {} seconds", MIN_SESSION_SECS)]
  SessionTooShort,

  #[error("select a subject first")]
  NoSubjectSelected,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
