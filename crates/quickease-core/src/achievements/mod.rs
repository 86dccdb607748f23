//! Client-side badge evaluation.
//!
//! On every stats refresh the full [`UserStatsSnapshot`] is rebuilt, checked
//! against the fixed [`RULES`] table in declaration order, and each newly
//! satisfied badge is granted on the backend and queued for display.

mod rules;
mod state;
mod stats;

pub use rules::{AchievementRule, RULES};
pub use state::{AchievementState, Badge, EvaluationReport};
pub use stats::UserStatsSnapshot;
