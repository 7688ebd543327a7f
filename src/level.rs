//! Quiz-based user level prediction. Pure, no model call.

use crate::domain::UserLevel;

/// Decision table, evaluated in order:
/// 1. score >= 7 and time_taken <= 80 → Advanced
/// 2. 4 <= score < 7                  → Intermediate
/// 3. otherwise                       → Beginner
///
/// A high score with a slow time matches neither of the first two rules and
/// lands on Beginner.
pub fn predict_user_level(score: f64, time_taken: f64) -> UserLevel {
  if score >= 7.0 && time_taken <= 80.0 {
    UserLevel::Advanced
  } else if (4.0..7.0).contains(&score) {
    UserLevel::Intermediate
  } else {
    UserLevel::Beginner
  }
}
