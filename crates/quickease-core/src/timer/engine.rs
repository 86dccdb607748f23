//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads and never reads the system clock itself: every command
//! takes the current time from the caller, and remaining time is always
//! recomputed from the start timestamp rather than accumulated per tick.
//! Missed ticks (device sleep, throttled background work) therefore cost
//! nothing but display latency.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v  (remaining hits 0, or skip)
//!   Study  -> ShortBreak | LongBreak   (BreakPending until acknowledged)
//!   Break  -> Study
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerSettings::default());
//! engine.start(Utc::now());
//! // On every tick source:
//! engine.tick(Utc::now()); // Returns Some(Event) when the session completes
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::settings::{SessionKind, TimerSettings, CYCLES_PER_LONG_BREAK};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    /// Not started since the last reset or session transition.
    Idle,
    Running,
    Paused,
    /// A study session just ended and the break notice has not been dismissed.
    BreakPending,
}

/// Running/paused bookkeeping.
///
/// A start timestamp and a frozen remaining time are mutually exclusive,
/// so they live in one enum rather than two nullable fields. The frozen
/// value keeps millisecond precision so repeated pause/resume never loses
/// sub-second remainders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
enum Countdown {
    Stopped,
    Running { started_at: DateTime<Utc> },
    Paused { remaining_ms: u64 },
}

/// Core pomodoro timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    settings: TimerSettings,
    session_kind: SessionKind,
    /// Incremented once per completed study session.
    cycle_count: u32,
    countdown: Countdown,
    #[serde(default)]
    break_pending: bool,
    /// Last computed remaining time, for display between ticks.
    remaining_secs: u64,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(TimerSettings::default())
    }
}

impl TimerEngine {
    /// Create an idle engine at the start of a study session.
    pub fn new(settings: TimerSettings) -> Self {
        let remaining_secs = settings.duration_secs(SessionKind::Study);
        Self {
            settings,
            session_kind: SessionKind::Study,
            cycle_count: 0,
            countdown: Countdown::Stopped,
            break_pending: false,
            remaining_secs,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> TimerStatus {
        match self.countdown {
            Countdown::Running { .. } => TimerStatus::Running,
            Countdown::Paused { .. } => TimerStatus::Paused,
            Countdown::Stopped if self.break_pending => TimerStatus::BreakPending,
            Countdown::Stopped => TimerStatus::Idle,
        }
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn session_kind(&self) -> SessionKind {
        self.session_kind
    }

    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    pub fn is_running(&self) -> bool {
        matches!(self.countdown, Countdown::Running { .. })
    }

    pub fn break_pending(&self) -> bool {
        self.break_pending
    }

    pub fn start_timestamp(&self) -> Option<DateTime<Utc>> {
        match self.countdown {
            Countdown::Running { started_at } => Some(started_at),
            _ => None,
        }
    }

    pub fn paused_remaining_seconds(&self) -> Option<u64> {
        match self.countdown {
            Countdown::Paused { remaining_ms } => Some(ms_to_secs(remaining_ms)),
            _ => None,
        }
    }

    /// Full length of the current session.
    pub fn total_secs(&self) -> u64 {
        self.settings.duration_secs(self.session_kind)
    }

    /// Cached remaining time as of the last command or tick.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Remaining time derived from the wall clock, without mutating state.
    ///
    /// Whole seconds, counted as `total - floor(elapsed)`, so a fresh
    /// 25-minute session reads 1500 until a full second has passed.
    pub fn remaining_secs_at(&self, now: DateTime<Utc>) -> u64 {
        ms_to_secs(self.remaining_ms_at(now))
    }

    fn remaining_ms_at(&self, now: DateTime<Utc>) -> u64 {
        match self.countdown {
            Countdown::Running { started_at } => self
                .total_ms()
                .saturating_sub(elapsed_ms(started_at, now)),
            Countdown::Paused { remaining_ms } => remaining_ms,
            Countdown::Stopped => self.total_ms(),
        }
    }

    fn total_ms(&self) -> u64 {
        self.total_secs().saturating_mul(1000)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            status: self.status(),
            session_kind: self.session_kind,
            cycle_count: self.cycle_count,
            remaining_secs: self.remaining_secs_at(now),
            total_secs: self.total_secs(),
            break_pending: self.break_pending,
            timer_visible: self.settings.timer_visible,
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        match self.countdown {
            Countdown::Running { .. } => None,
            Countdown::Paused { remaining_ms } => {
                let consumed = self.total_ms().saturating_sub(remaining_ms);
                self.countdown = Countdown::Running {
                    started_at: now - millis(consumed),
                };
                let remaining_secs = ms_to_secs(remaining_ms);
                self.remaining_secs = remaining_secs;
                debug!(remaining_secs, "timer resumed");
                Some(Event::TimerResumed {
                    session_kind: self.session_kind,
                    remaining_secs,
                    at: now,
                })
            }
            Countdown::Stopped => {
                // Starting the break counts as acknowledging it.
                self.break_pending = false;
                self.countdown = Countdown::Running { started_at: now };
                self.remaining_secs = self.total_secs();
                debug!(session = ?self.session_kind, "timer started");
                Some(Event::TimerStarted {
                    session_kind: self.session_kind,
                    duration_secs: self.total_secs(),
                    at: now,
                })
            }
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let Countdown::Running { .. } = self.countdown else {
            return None;
        };
        let remaining_ms = self.remaining_ms_at(now);
        self.countdown = Countdown::Paused { remaining_ms };
        let remaining_secs = ms_to_secs(remaining_ms);
        self.remaining_secs = remaining_secs;
        debug!(remaining_secs, "timer paused");
        Some(Event::TimerPaused {
            session_kind: self.session_kind,
            remaining_secs,
            at: now,
        })
    }

    /// Recompute remaining time. Returns `Some(Event::SessionCompleted)`
    /// when the running session has reached zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let Countdown::Running { .. } = self.countdown else {
            return None;
        };
        self.remaining_secs = self.remaining_secs_at(now);
        if self.remaining_secs == 0 {
            return Some(self.complete_session(now, false));
        }
        None
    }

    /// End the current session immediately, as if it had run out.
    pub fn skip(&mut self, now: DateTime<Utc>) -> Option<Event> {
        Some(self.complete_session(now, true))
    }

    /// Dismiss the break notice. Session state is untouched.
    pub fn close_break_modal(&mut self) -> Option<Event> {
        if !self.break_pending {
            return None;
        }
        self.break_pending = false;
        Some(Event::BreakAcknowledged {
            session_kind: self.session_kind,
        })
    }

    /// Commit new settings and restart from a fresh, idle study session.
    pub fn apply_settings(&mut self, settings: TimerSettings) -> Option<Event> {
        self.settings = settings;
        self.reset_state();
        Some(Event::SettingsApplied {
            settings: self.settings.clone(),
        })
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.reset_state();
        Some(Event::TimerReset)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn reset_state(&mut self) {
        self.session_kind = SessionKind::Study;
        self.cycle_count = 0;
        self.countdown = Countdown::Stopped;
        self.break_pending = false;
        self.remaining_secs = self.total_secs();
    }

    fn complete_session(&mut self, now: DateTime<Utc>, skipped: bool) -> Event {
        let from = self.session_kind;
        let to = if from.is_break() {
            self.break_pending = false;
            SessionKind::Study
        } else {
            self.cycle_count += 1;
            self.break_pending = true;
            if self.cycle_count % CYCLES_PER_LONG_BREAK == 0 {
                SessionKind::LongBreak
            } else {
                SessionKind::ShortBreak
            }
        };
        self.session_kind = to;
        self.countdown = Countdown::Stopped;
        self.remaining_secs = self.total_secs();
        debug!(?from, ?to, cycle_count = self.cycle_count, skipped, "session completed");
        Event::SessionCompleted {
            from,
            to,
            cycle_count: self.cycle_count,
            skipped,
            at: now,
        }
    }
}

/// Milliseconds between `since` and `now`; 0 if the clock went backwards.
fn elapsed_ms(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - since).num_milliseconds()).unwrap_or(0)
}

/// Remaining milliseconds as displayed whole seconds (rounded up).
fn ms_to_secs(ms: u64) -> u64 {
    ms.div_ceil(1000)
}

fn millis(n: u64) -> Duration {
    Duration::milliseconds(i64::try_from(n).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(offset_secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::seconds(offset_secs)
    }

    fn run_out(engine: &mut TimerEngine, at: i64) -> Option<Event> {
        engine.start(t(at));
        engine.tick(t(at + engine.total_secs() as i64))
    }

    #[test]
    fn starts_idle_in_study() {
        let engine = TimerEngine::default();
        assert_eq!(engine.status(), TimerStatus::Idle);
        assert_eq!(engine.session_kind(), SessionKind::Study);
        assert_eq!(engine.cycle_count(), 0);
        assert_eq!(engine.remaining_secs(), 25 * 60);
        assert!(engine.start_timestamp().is_none());
        assert!(engine.paused_remaining_seconds().is_none());
    }

    #[test]
    fn pause_then_resume_keeps_remaining_time() {
        let mut engine = TimerEngine::default();
        engine.start(t(0));
        engine.pause(t(600));
        assert_eq!(engine.paused_remaining_seconds(), Some(900));
        assert!(engine.start_timestamp().is_none());

        engine.start(t(700));
        assert_eq!(engine.remaining_secs_at(t(700)), 900);
        assert_eq!(engine.start_timestamp(), Some(t(100)));
        assert!(engine.paused_remaining_seconds().is_none());
    }

    #[test]
    fn start_while_running_is_noop() {
        let mut engine = TimerEngine::default();
        assert!(engine.start(t(0)).is_some());
        assert!(engine.start(t(5)).is_none());
        assert_eq!(engine.start_timestamp(), Some(t(0)));
    }

    #[test]
    fn pause_when_not_running_is_noop() {
        let mut engine = TimerEngine::default();
        assert!(engine.pause(t(0)).is_none());
        assert_eq!(engine.status(), TimerStatus::Idle);
    }

    #[test]
    fn tick_survives_a_long_gap() {
        let mut engine = TimerEngine::default();
        engine.start(t(0));
        assert!(engine.tick(t(1)).is_none());
        // No ticks for ten minutes (device asleep).
        assert!(engine.tick(t(601)).is_none());
        assert_eq!(engine.remaining_secs(), 25 * 60 - 601);
    }

    #[test]
    fn remaining_time_never_goes_negative() {
        let mut engine = TimerEngine::default();
        engine.start(t(0));
        assert_eq!(engine.remaining_secs_at(t(10_000)), 0);
        engine.pause(t(10_000));
        assert_eq!(engine.paused_remaining_seconds(), Some(0));
    }

    #[test]
    fn study_completion_goes_to_short_break_and_sets_pending() {
        let mut engine = TimerEngine::default();
        let event = run_out(&mut engine, 0);
        assert!(matches!(
            event,
            Some(Event::SessionCompleted {
                from: SessionKind::Study,
                to: SessionKind::ShortBreak,
                cycle_count: 1,
                skipped: false,
                ..
            })
        ));
        assert_eq!(engine.status(), TimerStatus::BreakPending);
        assert!(engine.break_pending());
        assert_eq!(engine.remaining_secs(), 5 * 60);
    }

    #[test]
    fn fourth_study_completion_goes_to_long_break() {
        let mut engine = TimerEngine::default();
        for _ in 0..3 {
            engine.skip(t(0)); // study -> short break
            engine.skip(t(0)); // short break -> study
        }
        assert_eq!(engine.cycle_count(), 3);
        run_out(&mut engine, 0);
        assert_eq!(engine.cycle_count(), 4);
        assert_eq!(engine.session_kind(), SessionKind::LongBreak);
        assert!(engine.break_pending());
    }

    #[test]
    fn break_completion_returns_to_study_and_clears_pending() {
        let mut engine = TimerEngine::default();
        engine.skip(t(0));
        assert!(engine.break_pending());
        let event = run_out(&mut engine, 10);
        assert!(matches!(
            event,
            Some(Event::SessionCompleted {
                from: SessionKind::ShortBreak,
                to: SessionKind::Study,
                ..
            })
        ));
        assert!(!engine.break_pending());
        assert_eq!(engine.status(), TimerStatus::Idle);
        assert_eq!(engine.cycle_count(), 1);
    }

    #[test]
    fn skip_clears_both_clock_fields() {
        let mut engine = TimerEngine::default();
        engine.start(t(0));
        engine.skip(t(30));
        assert!(engine.start_timestamp().is_none());
        assert!(engine.paused_remaining_seconds().is_none());

        let mut engine = TimerEngine::default();
        engine.start(t(0));
        engine.pause(t(30));
        let event = engine.skip(t(40));
        assert!(matches!(event, Some(Event::SessionCompleted { skipped: true, .. })));
        assert!(engine.start_timestamp().is_none());
        assert!(engine.paused_remaining_seconds().is_none());
    }

    #[test]
    fn close_break_modal_only_clears_flag() {
        let mut engine = TimerEngine::default();
        engine.skip(t(0));
        let kind = engine.session_kind();
        let cycles = engine.cycle_count();
        assert!(engine.close_break_modal().is_some());
        assert!(!engine.break_pending());
        assert_eq!(engine.session_kind(), kind);
        assert_eq!(engine.cycle_count(), cycles);
        assert_eq!(engine.status(), TimerStatus::Idle);
        assert!(engine.close_break_modal().is_none());
    }

    #[test]
    fn starting_the_break_acknowledges_it() {
        let mut engine = TimerEngine::default();
        engine.skip(t(0));
        engine.start(t(1));
        assert!(!engine.break_pending());
        assert_eq!(engine.status(), TimerStatus::Running);
    }

    #[test]
    fn apply_settings_resets_to_fresh_study() {
        let mut engine = TimerEngine::default();
        engine.skip(t(0));
        engine.start(t(1));
        let settings = TimerSettings {
            study_minutes: 50,
            ..TimerSettings::default()
        };
        engine.apply_settings(settings.clone());
        assert_eq!(engine.settings(), &settings);
        assert_eq!(engine.status(), TimerStatus::Idle);
        assert_eq!(engine.session_kind(), SessionKind::Study);
        assert_eq!(engine.cycle_count(), 0);
        assert_eq!(engine.remaining_secs(), 50 * 60);
    }

    #[test]
    fn serde_roundtrip_preserves_running_state() {
        let mut engine = TimerEngine::default();
        engine.start(t(0));
        let json = serde_json::to_string(&engine).unwrap();
        let restored: TimerEngine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.start_timestamp(), Some(t(0)));
        assert_eq!(restored.remaining_secs_at(t(60)), 25 * 60 - 60);
    }

    #[test]
    fn snapshot_reports_live_remaining() {
        let mut engine = TimerEngine::default();
        engine.start(t(0));
        match engine.snapshot(t(90)) {
            Event::StateSnapshot {
                status,
                remaining_secs,
                total_secs,
                ..
            } => {
                assert_eq!(status, TimerStatus::Running);
                assert_eq!(remaining_secs, 25 * 60 - 90);
                assert_eq!(total_secs, 25 * 60);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }
}
