mod engine;
mod scheduler;
mod settings;

pub use engine::{TimerEngine, TimerStatus};
pub use scheduler::{
    Clock, SleepWatchdog, SystemClock, TickScheduler, TickSource, TickSubscription,
    SLEEP_GAP_THRESHOLD_MS, TICK_PERIOD,
};
pub use settings::{SessionKind, TimerSettings, CYCLES_PER_LONG_BREAK};
