use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Number of completed study sessions between long breaks.
pub const CYCLES_PER_LONG_BREAK: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Study,
    ShortBreak,
    LongBreak,
}

impl SessionKind {
    pub fn is_break(self) -> bool {
        !matches!(self, SessionKind::Study)
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionKind::Study => "Study",
            SessionKind::ShortBreak => "Short Break",
            SessionKind::LongBreak => "Long Break",
        }
    }
}

/// User-configurable pomodoro settings, persisted on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_study_minutes")]
    pub study_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_true")]
    pub timer_visible: bool,
}

fn default_study_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_true() -> bool {
    true
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            study_minutes: default_study_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            timer_visible: true,
        }
    }
}

impl TimerSettings {
    pub fn minutes(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Study => self.study_minutes,
            SessionKind::ShortBreak => self.short_break_minutes,
            SessionKind::LongBreak => self.long_break_minutes,
        }
    }

    /// Session length in whole seconds (`minutes * 60`).
    pub fn duration_secs(&self, kind: SessionKind) -> u64 {
        u64::from(self.minutes(kind)).saturating_mul(60)
    }

    /// Reject zero-length sessions before they reach the backend.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("study_minutes", self.study_minutes),
            ("short_break_minutes", self.short_break_minutes),
            ("long_break_minutes", self.long_break_minutes),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be at least 1 minute".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_minutes_times_sixty() {
        let s = TimerSettings::default();
        assert_eq!(s.duration_secs(SessionKind::Study), 25 * 60);
        assert_eq!(s.duration_secs(SessionKind::ShortBreak), 5 * 60);
        assert_eq!(s.duration_secs(SessionKind::LongBreak), 15 * 60);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let s: TimerSettings = serde_json::from_str(r#"{"study_minutes": 50}"#).unwrap();
        assert_eq!(s.study_minutes, 50);
        assert_eq!(s.short_break_minutes, 5);
        assert!(s.timer_visible);
    }

    #[test]
    fn validate_rejects_zero_minutes() {
        let s = TimerSettings {
            short_break_minutes: 0,
            ..TimerSettings::default()
        };
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("short_break_minutes"));
        assert!(TimerSettings::default().validate().is_ok());
    }

    #[test]
    fn only_study_is_not_a_break() {
        assert!(!SessionKind::Study.is_break());
        assert!(SessionKind::ShortBreak.is_break());
        assert!(SessionKind::LongBreak.is_break());
    }

    #[test]
    fn labels_are_human_readable() {
        assert_eq!(SessionKind::Study.label(), "Study");
        assert_eq!(SessionKind::LongBreak.label(), "Long Break");
    }
}
