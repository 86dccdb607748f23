//! Authenticated study session.
//!
//! One `StudySession` exists per logged-in user. It owns the timer engine,
//! the achievement state and any unsaved settings, and is passed explicitly
//! to whatever drives the UI. Logging out consumes it.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::achievements::{AchievementState, EvaluationReport, UserStatsSnapshot};
use crate::backend::Backend;
use crate::error::{BackendError, CoreError, DatabaseError};
use crate::events::Event;
use crate::storage::LocalStore;
use crate::timer::{Clock, TickScheduler, TickSource, TimerEngine, TimerSettings};

/// The part of a session that survives a restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub timer: TimerEngine,
    pub achievements: AchievementState,
    /// Edited settings not yet accepted by the backend.
    #[serde(default)]
    pub pending_settings: Option<TimerSettings>,
}

pub struct StudySession<B> {
    backend: B,
    state: SessionState,
    local: Option<LocalStore>,
}

impl<B: Backend> StudySession<B> {
    /// Start a session right after login: pull the user's pomodoro settings
    /// and earned badges from the backend.
    ///
    /// Non-auth failures are logged and fall back to `fallback` settings and
    /// the locally mirrored badge set.
    ///
    /// # Errors
    /// Returns the backend error if the credentials are rejected.
    pub async fn open(
        backend: B,
        fallback: TimerSettings,
        local: Option<LocalStore>,
    ) -> Result<Self, BackendError> {
        let settings = match backend.load_settings().await {
            Ok(Some(settings)) => settings,
            Ok(None) => fallback,
            Err(e) if e.is_auth_failure() => return Err(e),
            Err(e) => {
                warn!(error = %e, "could not load pomodoro settings, using defaults");
                fallback
            }
        };

        let mut achievements = AchievementState::default();
        match backend.fetch_earned().await {
            Ok(ids) => achievements.merge_earned(ids),
            Err(e) if e.is_auth_failure() => return Err(e),
            Err(e) => {
                warn!(error = %e, "could not fetch earned badges, using local mirror");
                if let Some(local) = &local {
                    match local.earned_badges() {
                        Ok(ids) => achievements.merge_earned(ids),
                        Err(e) => warn!(error = %e, "local badge mirror unreadable"),
                    }
                }
            }
        }

        let session = Self {
            backend,
            state: SessionState {
                timer: TimerEngine::new(settings),
                achievements,
                pending_settings: None,
            },
            local,
        };
        session.mirror_earned();
        Ok(session)
    }

    /// Rebuild a session from previously persisted state.
    pub fn from_state(backend: B, state: SessionState) -> Self {
        Self {
            backend,
            state,
            local: None,
        }
    }

    pub fn with_local_cache(mut self, local: LocalStore) -> Self {
        self.local = Some(local);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.state.timer
    }

    pub fn timer_mut(&mut self) -> &mut TimerEngine {
        &mut self.state.timer
    }

    pub fn achievements(&self) -> &AchievementState {
        &self.state.achievements
    }

    pub fn achievements_mut(&mut self) -> &mut AchievementState {
        &mut self.state.achievements
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn local(&self) -> Option<&LocalStore> {
        self.local.as_ref()
    }

    /// Persist the session state to the local cache, if one is attached.
    ///
    /// # Errors
    /// Returns an error if the cache write fails.
    pub fn persist(&self) -> Result<(), DatabaseError> {
        match &self.local {
            Some(local) => local.save_session_state(&self.state),
            None => Ok(()),
        }
    }

    /// Tear the session down. Local user data is wiped; the timer and badge
    /// state are dropped with `self`.
    ///
    /// # Errors
    /// Returns an error if the local cache cannot be cleared.
    pub fn logout(self) -> Result<(), DatabaseError> {
        debug!("session closed");
        match &self.local {
            Some(local) => local.clear_session(),
            None => Ok(()),
        }
    }

    // ── Timer ────────────────────────────────────────────────────────

    /// Every tick source ends up here.
    pub fn handle_tick(&mut self, source: TickSource, now: chrono::DateTime<chrono::Utc>) -> Option<Event> {
        if source != TickSource::Interval {
            debug!(?source, "out-of-band tick");
        }
        self.state.timer.tick(now)
    }

    /// Feed scheduler triggers into the timer until `on_tick` breaks or the
    /// scheduler closes.
    pub async fn drive<C, F>(&mut self, scheduler: &mut TickScheduler, clock: &C, on_tick: F)
    where
        C: Clock,
        F: FnMut(TickSource, Option<&Event>, &TimerEngine) -> ControlFlow<()>,
    {
        scheduler.drive(&mut self.state.timer, clock, on_tick).await;
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// Stage a settings change without touching the running timer.
    pub fn edit_settings(&mut self, settings: TimerSettings) {
        self.state.pending_settings = Some(settings);
    }

    pub fn pending_settings(&self) -> Option<&TimerSettings> {
        self.state.pending_settings.as_ref()
    }

    /// Save the staged settings to the backend and apply them.
    ///
    /// On failure the staged change is kept, un-applied, for the caller to
    /// report and the user to retry.
    ///
    /// # Errors
    /// Returns a validation error or the backend error.
    pub async fn save_settings(&mut self) -> Result<Option<Event>, CoreError> {
        let Some(pending) = self.state.pending_settings.clone() else {
            return Ok(None);
        };
        pending.validate()?;
        self.backend.save_settings(&pending).await?;
        self.state.pending_settings = None;
        Ok(self.state.timer.apply_settings(pending))
    }

    // ── Achievements ─────────────────────────────────────────────────

    /// Recompute the stats snapshot from scratch and grant new badges.
    ///
    /// # Errors
    /// Returns the backend error if any of the three collections cannot be
    /// fetched. Individual grant failures do not error; see
    /// [`EvaluationReport::failed`].
    pub async fn refresh_achievements(&mut self) -> Result<EvaluationReport, BackendError> {
        let (notes, flashcards, quizzes) = tokio::try_join!(
            self.backend.list_notes(),
            self.backend.list_flashcards(),
            self.backend.list_quizzes(),
        )?;
        let snapshot = UserStatsSnapshot::from_collections(&notes, &flashcards, &quizzes);
        debug!(?snapshot, "stats refreshed");

        let report = self
            .state
            .achievements
            .evaluate(&snapshot, &self.backend)
            .await;

        if let Some(local) = &self.local {
            if let Err(e) = local.record_note_dates(&notes) {
                warn!(error = %e, "could not cache note dates");
            }
        }
        self.mirror_earned();
        Ok(report)
    }

    fn mirror_earned(&self) {
        if let Some(local) = &self.local {
            if let Err(e) = local.save_earned_badges(self.state.achievements.earned()) {
                warn!(error = %e, "could not mirror earned badges");
            }
        }
    }
}
