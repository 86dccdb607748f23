use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::achievements::Badge;
use crate::timer::{SessionKind, TimerSettings, TimerStatus};

/// Every state change in the core produces an Event.
/// The UI layer renders them; the CLI prints them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        session_kind: SessionKind,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        session_kind: SessionKind,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        session_kind: SessionKind,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A session ran out or was skipped.
    SessionCompleted {
        from: SessionKind,
        to: SessionKind,
        cycle_count: u32,
        skipped: bool,
        at: DateTime<Utc>,
    },
    /// The user dismissed the break notice.
    BreakAcknowledged {
        session_kind: SessionKind,
    },
    SettingsApplied {
        settings: TimerSettings,
    },
    TimerReset,
    StateSnapshot {
        status: TimerStatus,
        session_kind: SessionKind,
        cycle_count: u32,
        remaining_secs: u64,
        total_secs: u64,
        break_pending: bool,
        timer_visible: bool,
        at: DateTime<Utc>,
    },
    /// A badge was granted and queued for display.
    BadgeUnlocked {
        badge: Badge,
    },
    /// The front of the badge queue was acknowledged.
    BadgeAcknowledged {
        badge: Badge,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let json = serde_json::to_value(Event::BreakAcknowledged {
            session_kind: SessionKind::LongBreak,
        })
        .unwrap();
        assert_eq!(json["type"], "break_acknowledged");
        assert_eq!(json["session_kind"], "long_break");
    }
}
