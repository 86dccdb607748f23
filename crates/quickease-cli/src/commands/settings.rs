use clap::Subcommand;
use quickease_core::backend::SettingsStore as _;
use quickease_core::{BackendClient, Config, CoreError, LocalStore, StudySession, TimerSettings};
use serde_json::json;

use super::{finish_session, load_state, open_session, print_json, CliResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show the active and any unsaved settings
    Show,
    /// Change durations; saved to the backend, then applied
    Set {
        /// Study session length in minutes
        #[arg(long)]
        study: Option<u32>,
        /// Short break length in minutes
        #[arg(long)]
        short_break: Option<u32>,
        /// Long break length in minutes
        #[arg(long)]
        long_break: Option<u32>,
        /// Show or hide the countdown
        #[arg(long)]
        visible: Option<bool>,
    },
    /// Retry saving settings that failed earlier
    Retry,
    /// Fetch the settings stored on the backend
    Pull,
}

pub async fn run(action: SettingsAction, config: &Config) -> CliResult {
    match action {
        SettingsAction::Show => {
            let state = load_state(&LocalStore::open()?, config);
            print_json(&json!({
                "active": state.timer.settings(),
                "pending": state.pending_settings,
            }))
        }
        SettingsAction::Set {
            study,
            short_break,
            long_break,
            visible,
        } => {
            let mut session = open_session(config)?;
            let base = session
                .pending_settings()
                .unwrap_or(session.timer().settings())
                .clone();
            session.edit_settings(TimerSettings {
                study_minutes: study.unwrap_or(base.study_minutes),
                short_break_minutes: short_break.unwrap_or(base.short_break_minutes),
                long_break_minutes: long_break.unwrap_or(base.long_break_minutes),
                timer_visible: visible.unwrap_or(base.timer_visible),
            });
            save(session).await
        }
        SettingsAction::Retry => {
            let session = open_session(config)?;
            if session.pending_settings().is_none() {
                println!("nothing to save");
                return Ok(());
            }
            save(session).await
        }
        SettingsAction::Pull => {
            let session = open_session(config)?;
            let result = session.backend().load_settings().await;
            if let Ok(remote) = &result {
                print_json(remote)?;
            }
            finish_session(session, result.as_ref().err())?;
            result?;
            Ok(())
        }
    }
}

async fn save(mut session: StudySession<BackendClient>) -> CliResult {
    let result = session.save_settings().await;
    let outcome = match &result {
        Err(CoreError::Backend(e)) => Some(e),
        _ => None,
    };
    if let Ok(Some(event)) = &result {
        print_json(event)?;
    }
    // A failed save leaves the edit pending for `retry`.
    finish_session(session, outcome)?;
    result.map(|_| ()).map_err(Into::into)
}
