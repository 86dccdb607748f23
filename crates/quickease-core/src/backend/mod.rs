//! Thin async client for the remote REST backend and the traits the rest
//! of the core consumes it through.

mod client;
mod models;
mod traits;

pub use client::BackendClient;
pub use models::{
    AuthTokens, EarnedAchievement, Flashcard, GrantOutcome, Note, PomodoroSettingsRecord,
    QuizRecord,
};
pub use traits::{AchievementStore, Backend, SettingsStore, StatsSource};
