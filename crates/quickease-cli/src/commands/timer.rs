use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::Utc;
use clap::Subcommand;
use quickease_core::timer::{SystemClock, TICK_PERIOD};
use quickease_core::{Config, Event, LocalStore, TickScheduler, TimerEngine, TimerStatus};

use super::{load_state, print_json, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the current session
    Start,
    /// Pause the running session
    Pause,
    /// End the current session immediately
    Skip,
    /// Dismiss the break prompt
    CloseBreak,
    /// Back to a fresh study session and cycle 0
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Follow the running timer until the session ends or Ctrl-C
    Watch,
}

pub async fn run(action: TimerAction, config: &Config) -> CliResult {
    let local = LocalStore::open()?;
    let mut state = load_state(&local, config);
    let timer = &mut state.timer;
    let now = Utc::now();

    // Each invocation is a return to the app: settle elapsed time first.
    if let Some(completed) = timer.tick(now) {
        print_json(&completed)?;
    }

    let event = match action {
        TimerAction::Start => timer.start(now),
        TimerAction::Pause => timer.pause(now),
        TimerAction::Skip => timer.skip(now),
        TimerAction::CloseBreak => timer.close_break_modal(),
        TimerAction::Reset => timer.reset(),
        TimerAction::Status => None,
        TimerAction::Watch => {
            let running = timer.is_running();
            if running {
                watch(timer).await?;
            }
            local.save_session_state(&state)?;
            return if running {
                Ok(())
            } else {
                Err("timer is not running".into())
            };
        }
    };

    match event {
        Some(event) => print_json(&event)?,
        None => print_json(&timer.snapshot(now))?,
    }
    local.save_session_state(&state)?;
    Ok(())
}

async fn watch(timer: &mut TimerEngine) -> CliResult {
    let clock = Arc::new(SystemClock);
    let mut scheduler = TickScheduler::new();
    scheduler.spawn(Arc::clone(&clock), TICK_PERIOD);

    let mut failed = None;
    let follow = scheduler.drive(timer, clock.as_ref(), |source, event, timer| {
        match event {
            Some(event) => {
                if let Err(e) = print_json(event) {
                    failed = Some(e);
                    return ControlFlow::Break(());
                }
            }
            None => eprint!(
                "\r{}: {:>5}s remaining ({source:?})   ",
                timer.session_kind().label(),
                timer.remaining_secs()
            ),
        }
        step(timer.status(), event)
    });

    tokio::select! {
        () = follow => {}
        res = tokio::signal::ctrl_c() => res?,
    }
    eprintln!();
    failed.map_or(Ok(()), Err)
}

fn step(status: TimerStatus, event: Option<&Event>) -> ControlFlow<()> {
    match (status, event) {
        (_, Some(Event::SessionCompleted { .. })) => ControlFlow::Break(()),
        (TimerStatus::Running, _) => ControlFlow::Continue(()),
        _ => ControlFlow::Break(()),
    }
}
