//! Input validation for user-entered subject, task and session fields.
//!
//! Validation happens in the screen layer before anything reaches the store;
//! the store itself trusts its inputs. Each rule returns the canonical value
//! (trimmed, parsed) so callers persist exactly what was validated.

use crate::{
  Error, Result,
  session::MIN_SESSION_SECS,
  subject::{Palette, SubjectDraft, SubjectId},
};

pub const MIN_NAME_CHARS: usize = 2;
pub const MAX_NAME_CHARS: usize = 20;
pub const MIN_GOAL_HOURS: f64 = 1.0;
pub const MAX_GOAL_HOURS: f64 = 100.0;

/// Validate a subject name. Surrounding whitespace is trimmed before the
/// length rules apply; the trimmed name is returned.
pub fn subject_name(input: &str) -> Result<String> {
  let name = input.trim();
  if name.is_empty() {
    return Err(Error::NameBlank);
  }
  let chars = name.chars().count();
  if chars < MIN_NAME_CHARS {
    Err(Error::NameTooShort)
  } else if chars > MAX_NAME_CHARS {
    Err(Error::NameTooLong)
  } else {
    Ok(name.to_owned())
  }
}

/// Parse and validate a study-hours goal typed as text.
pub fn goal_hours(input: &str) -> Result<f64> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(Error::GoalBlank);
  }
  let value: f64 = trimmed.parse().map_err(|_| Error::GoalNotANumber)?;
  if !value.is_finite() {
    return Err(Error::GoalNotANumber);
  }
  if value < MIN_GOAL_HOURS {
    Err(Error::GoalTooLow)
  } else if value > MAX_GOAL_HOURS {
    Err(Error::GoalTooHigh)
  } else {
    Ok(value)
  }
}

/// Reject sessions shorter than [`MIN_SESSION_SECS`].
pub fn session_duration(secs: i64) -> Result<i64> {
  if secs < MIN_SESSION_SECS {
    Err(Error::SessionTooShort)
  } else {
    Ok(secs)
  }
}

/// Require a selected subject before a session or task can be saved.
pub fn selected_subject<T>(selected: Option<T>) -> Result<T> {
  selected.ok_or(Error::NoSubjectSelected)
}

/// Validate raw name and goal input together and assemble a draft ready for
/// the store. The name rule is checked first, then the goal.
pub fn subject_draft(
  subject_id: Option<SubjectId>,
  name_input: &str,
  goal_hours_input: &str,
  palette: Palette,
) -> Result<SubjectDraft> {
  let name = subject_name(name_input)?;
  let goal_hours = goal_hours(goal_hours_input)?;
  Ok(SubjectDraft { subject_id, name, goal_hours, palette })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn name_rules() {
    assert_eq!(subject_name("  Maths  ").as_deref(), Ok("Maths"));
    assert_eq!(subject_name(""), Err(Error::NameBlank));
    assert_eq!(subject_name("   "), Err(Error::NameBlank));
    assert_eq!(subject_name("A"), Err(Error::NameTooShort));
    assert_eq!(
      subject_name(&"x".repeat(MAX_NAME_CHARS + 1)),
      Err(Error::NameTooLong)
    );
    assert!(subject_name(&"x".repeat(MAX_NAME_CHARS)).is_ok());
  }

  #[test]
  fn goal_rules() {
    assert_eq!(goal_hours("12.5"), Ok(12.5));
    assert_eq!(goal_hours(" 1 "), Ok(1.0));
    assert_eq!(goal_hours("100"), Ok(100.0));
    assert_eq!(goal_hours(""), Err(Error::GoalBlank));
    assert_eq!(goal_hours("ten"), Err(Error::GoalNotANumber));
    assert_eq!(goal_hours("NaN"), Err(Error::GoalNotANumber));
    assert_eq!(goal_hours("0.5"), Err(Error::GoalTooLow));
    assert_eq!(goal_hours("100.1"), Err(Error::GoalTooHigh));
  }

  #[test]
  fn session_duration_floor() {
    assert_eq!(session_duration(35), Err(Error::SessionTooShort));
    assert_eq!(session_duration(36), Ok(36));
    assert_eq!(session_duration(3600), Ok(3600));
  }

  #[test]
  fn selected_subject_is_required() {
    assert_eq!(selected_subject(Some(1)), Ok(1));
    assert_eq!(selected_subject::<i32>(None), Err(Error::NoSubjectSelected));
  }

  #[test]
  fn draft_checks_name_before_goal() {
    let err = subject_draft(None, "", "", Palette::PRESETS[0]).unwrap_err();
    assert_eq!(err, Error::NameBlank);
  }

  #[test]
  fn draft_carries_canonical_values() {
    let draft =
      subject_draft(None, " Physics ", " 10 ", Palette::PRESETS[1]).unwrap();
    assert_eq!(draft.name, "Physics");
    assert_eq!(draft.goal_hours, 10.0);
    assert_eq!(draft.subject_id, None);
  }
}
