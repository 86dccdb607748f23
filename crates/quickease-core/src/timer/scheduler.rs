//! Tick sources for the timer engine.
//!
//! Three independent triggers wake the engine: a ~1 Hz interval, the host
//! regaining visibility/focus, and a sleep watchdog that notices when real
//! time jumped past the expected firing gap. All of them arrive on one
//! stream and lead to the same `TimerEngine::tick(now)` call; none of them
//! carries state of its own.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::TimerEngine;
use crate::events::Event;

/// Regular tick cadence.
pub const TICK_PERIOD: StdDuration = StdDuration::from_secs(1);

/// Real-time gap between watchdog firings that counts as a suspected sleep.
pub const SLEEP_GAP_THRESHOLD_MS: i64 = 2_000;

/// Source of the current time. Injected so tests can use synthetic timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickSource {
    Interval,
    VisibilityRegained,
    Watchdog,
}

/// Detects suspected device sleep from gaps between consecutive observations.
#[derive(Debug, Clone)]
pub struct SleepWatchdog {
    last_seen: Option<DateTime<Utc>>,
    threshold: Duration,
}

impl Default for SleepWatchdog {
    fn default() -> Self {
        Self::new(Duration::milliseconds(SLEEP_GAP_THRESHOLD_MS))
    }
}

impl SleepWatchdog {
    pub fn new(threshold: Duration) -> Self {
        Self {
            last_seen: None,
            threshold,
        }
    }

    /// Record an observation. Returns true when the gap since the previous
    /// one exceeds the threshold.
    pub fn observe(&mut self, now: DateTime<Utc>) -> bool {
        let gap_exceeded = self
            .last_seen
            .map(|last| now - last > self.threshold)
            .unwrap_or(false);
        self.last_seen = Some(now);
        gap_exceeded
    }
}

/// A handle that feeds one kind of trigger into a [`TickScheduler`].
#[derive(Debug, Clone)]
pub struct TickSubscription {
    source: TickSource,
    tx: mpsc::UnboundedSender<TickSource>,
}

impl TickSubscription {
    pub fn source(&self) -> TickSource {
        self.source
    }

    /// Push one trigger. Returns false once the scheduler is gone.
    pub fn fire(&self) -> bool {
        self.tx.send(self.source).is_ok()
    }
}

/// Funnels every tick source into a single stream.
pub struct TickScheduler {
    tx: mpsc::UnboundedSender<TickSource>,
    rx: mpsc::UnboundedReceiver<TickSource>,
    tasks: Vec<JoinHandle<()>>,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickScheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            tasks: Vec::new(),
        }
    }

    pub fn on_tick(&self) -> TickSubscription {
        self.subscription(TickSource::Interval)
    }

    /// Handle for the host to call when the app becomes visible again.
    pub fn on_visible(&self) -> TickSubscription {
        self.subscription(TickSource::VisibilityRegained)
    }

    pub fn on_watchdog(&self) -> TickSubscription {
        self.subscription(TickSource::Watchdog)
    }

    fn subscription(&self, source: TickSource) -> TickSubscription {
        TickSubscription {
            source,
            tx: self.tx.clone(),
        }
    }

    /// Spawn the regular interval and the sleep watchdog on the current
    /// tokio runtime.
    pub fn spawn<C: Clock + 'static>(&mut self, clock: Arc<C>, period: StdDuration) {
        let interval_sub = self.on_tick();
        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !interval_sub.fire() {
                    break;
                }
            }
        }));

        let watchdog_sub = self.on_watchdog();
        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut watchdog = SleepWatchdog::default();
            loop {
                interval.tick().await;
                if watchdog.observe(clock.now()) {
                    debug!("wall-clock gap detected, forcing tick");
                    if !watchdog_sub.fire() {
                        break;
                    }
                }
            }
        }));
    }

    /// Wait for the next trigger from any source.
    pub async fn next(&mut self) -> Option<TickSource> {
        self.rx.recv().await
    }

    /// Feed every trigger into `timer` until `on_tick` breaks or the stream
    /// closes.
    pub async fn drive<C, F>(&mut self, timer: &mut TimerEngine, clock: &C, mut on_tick: F)
    where
        C: Clock + ?Sized,
        F: FnMut(TickSource, Option<&Event>, &TimerEngine) -> ControlFlow<()>,
    {
        while let Some(source) = self.next().await {
            if source != TickSource::Interval {
                debug!(?source, "out-of-band tick");
            }
            let event = timer.tick(clock.now());
            if on_tick(source, event.as_ref(), timer).is_break() {
                break;
            }
        }
    }

    /// Stop the spawned tasks. Subscriptions stay valid.
    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
