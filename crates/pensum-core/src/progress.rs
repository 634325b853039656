//! Derived study-progress arithmetic shared by the dashboard and subject
//! screens. Nothing here is stored; every figure is recomputed from the
//! current totals on each snapshot.

/// Convert a summed duration in seconds to hours, rounded to two decimals.
pub fn hours_studied(total_secs: i64) -> f64 {
  (total_secs as f64 / 3600.0 * 100.0).round() / 100.0
}

/// Fraction of the study goal reached, clamped to `[0, 1]`.
///
/// A goal of zero or less is treated as a goal of one hour, so a subject
/// with a missing or nonsensical goal still shows meaningful progress.
pub fn goal_fraction(hours_studied: f64, goal_hours: f64) -> f64 {
  let goal = if goal_hours > 0.0 { goal_hours } else { 1.0 };
  (hours_studied / goal).clamp(0.0, 1.0)
}

/// Display percentage for a progress fraction: rounded, clamped to
/// `[0, 100]`.
pub fn percent(fraction: f64) -> u8 {
  (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Parse a user-typed goal for progress display only. Blank or unparseable
/// input counts as a one-hour goal; save paths validate strictly instead.
pub fn goal_from_input(input: &str) -> f64 {
  input.trim().parse().unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hours_round_to_two_decimals() {
    assert_eq!(hours_studied(0), 0.0);
    assert_eq!(hours_studied(3600), 1.0);
    assert_eq!(hours_studied(5400), 1.5);
    // 1000 secs = 0.2777… hours
    assert_eq!(hours_studied(1000), 0.28);
    // 36 secs = 0.01 hours exactly at the rounding boundary
    assert_eq!(hours_studied(36), 0.01);
  }

  #[test]
  fn fraction_stays_in_unit_interval() {
    assert_eq!(goal_fraction(0.0, 10.0), 0.0);
    assert_eq!(goal_fraction(2.5, 10.0), 0.25);
    assert_eq!(goal_fraction(15.0, 10.0), 1.0);
  }

  #[test]
  fn nonsense_goal_counts_as_one_hour() {
    assert_eq!(goal_fraction(0.5, 0.0), 0.5);
    assert_eq!(goal_fraction(0.5, -3.0), 0.5);
    assert_eq!(goal_fraction(2.0, 0.0), 1.0);
  }

  #[test]
  fn percent_rounds_and_clamps() {
    assert_eq!(percent(0.0), 0);
    assert_eq!(percent(0.25), 25);
    assert_eq!(percent(0.996), 100);
    assert_eq!(percent(0.994), 99);
    assert_eq!(percent(1.0), 100);
  }

  #[test]
  fn goal_input_defaults_to_one() {
    assert_eq!(goal_from_input("10"), 10.0);
    assert_eq!(goal_from_input(" 2.5 "), 2.5);
    assert_eq!(goal_from_input(""), 1.0);
    assert_eq!(goal_from_input("abc"), 1.0);
  }

  #[test]
  fn worked_example() {
    // 9000 seconds against a 10 hour goal: 2.5 hours, a quarter done.
    let hours = hours_studied(9000);
    assert_eq!(hours, 2.5);
    let fraction = goal_fraction(hours, 10.0);
    assert_eq!(fraction, 0.25);
    assert_eq!(percent(fraction), 25);
  }
}
