//! Wire types for the REST backend. Only the fields the core reads are
//! modelled; anything else in the payload is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerSettings;

/// Access/refresh token pair returned by login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: i64,
    #[serde(default)]
    pub question: String,
}

/// A taken quiz with its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRecord {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "score")]
    pub earned_points: u32,
    #[serde(default, alias = "total_points")]
    pub possible_points: u32,
}

impl QuizRecord {
    pub fn is_perfect(&self) -> bool {
        self.possible_points > 0 && self.earned_points == self.possible_points
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarnedAchievement {
    pub badge_id: String,
    #[serde(default)]
    pub earned_at: Option<DateTime<Utc>>,
}

/// Stored pomodoro settings row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PomodoroSettingsRecord {
    pub id: i64,
    #[serde(flatten)]
    pub settings: TimerSettings,
}

/// Result of asking the backend to record a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    Granted,
    /// The backend already had this badge for the user.
    AlreadyGranted,
}

/// List endpoints may answer with a bare array or a paginated envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<T> {
    Page { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Page { results } => results,
            ListResponse::Bare(items) => items,
        }
    }
}
