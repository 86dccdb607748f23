//! # QuickEase Core Library
//!
//! The study-helper logic behind the QuickEase dashboard, independent of any
//! UI toolkit. Front-ends (the bundled CLI, or anything else) construct a
//! [`StudySession`] at login, dispatch user intents into it, and render the
//! [`Event`]s it returns.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based pomodoro state machine; remaining
//!   time is recomputed from timestamps on every `tick(now)`
//! - **Tick Scheduler**: Interval, visibility and sleep-watchdog triggers
//!   funnelled into one stream
//! - **Achievements**: Fixed badge rules evaluated against a freshly computed
//!   stats snapshot, with a FIFO display queue
//! - **Backend**: REST client for notes, flashcards, quizzes, achievements,
//!   pomodoro settings and auth
//! - **Storage**: TOML configuration and a SQLite local cache
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`AchievementState`]: Earned badges and the display queue
//! - [`BackendClient`]: REST client
//! - [`StudySession`]: Per-login owner of all of the above

pub mod achievements;
pub mod backend;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod timer;

pub use achievements::{AchievementState, Badge, EvaluationReport, UserStatsSnapshot};
pub use backend::{AuthTokens, Backend, BackendClient};
pub use error::{BackendError, ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use session::{SessionState, StudySession};
pub use storage::{Config, LocalStore};
pub use timer::{SessionKind, TickScheduler, TickSource, TimerEngine, TimerSettings, TimerStatus};
