use std::future::Future;

use super::models::{Flashcard, GrantOutcome, Note, QuizRecord};
use crate::error::BackendError;
use crate::timer::TimerSettings;

/// The three collections a stats snapshot is computed from.
pub trait StatsSource {
    fn list_notes(&self) -> impl Future<Output = Result<Vec<Note>, BackendError>> + Send;

    fn list_flashcards(&self) -> impl Future<Output = Result<Vec<Flashcard>, BackendError>> + Send;

    fn list_quizzes(&self) -> impl Future<Output = Result<Vec<QuizRecord>, BackendError>> + Send;
}

/// Remote record of earned badges.
pub trait AchievementStore {
    /// Ids of every badge the user already holds.
    fn fetch_earned(&self) -> impl Future<Output = Result<Vec<String>, BackendError>> + Send;

    /// Record a badge. Must tolerate being asked for one that already exists.
    fn grant(
        &self,
        badge_id: &str,
    ) -> impl Future<Output = Result<GrantOutcome, BackendError>> + Send;
}

/// Remote pomodoro settings.
pub trait SettingsStore {
    fn load_settings(
        &self,
    ) -> impl Future<Output = Result<Option<TimerSettings>, BackendError>> + Send;

    /// Create-or-update.
    fn save_settings(
        &self,
        settings: &TimerSettings,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// Everything a study session needs from the backend.
pub trait Backend: StatsSource + AchievementStore + SettingsStore {}

impl<T: StatsSource + AchievementStore + SettingsStore> Backend for T {}
