use clap::Subcommand;
use quickease_core::achievements::RULES;
use quickease_core::{Config, LocalStore};
use serde_json::json;

use super::{finish_session, load_state, open_session, print_json, CliResult};

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// Recompute stats from the backend and grant new badges
    Refresh,
    /// Show the badge waiting to be displayed
    Current,
    /// Dismiss the current badge
    Ack,
    /// List every badge with its earned flag
    List,
}

pub async fn run(action: AchievementsAction, config: &Config) -> CliResult {
    match action {
        AchievementsAction::Refresh => {
            let mut session = open_session(config)?;
            let result = session.refresh_achievements().await;
            if let Ok(report) = &result {
                for event in report.events() {
                    print_json(&event)?;
                }
                if !report.failed.is_empty() {
                    eprintln!("could not save: {}", report.failed.join(", "));
                }
            }
            finish_session(session, result.as_ref().err())?;
            result?;
        }
        AchievementsAction::Current => {
            let state = load_state(&LocalStore::open()?, config);
            match state.achievements.current() {
                Some(badge) => print_json(badge)?,
                None => println!("no badge pending"),
            }
        }
        AchievementsAction::Ack => {
            let local = LocalStore::open()?;
            let mut state = load_state(&local, config);
            match state.achievements.acknowledge() {
                Some(event) => print_json(&event)?,
                None => println!("no badge pending"),
            }
            local.save_session_state(&state)?;
        }
        AchievementsAction::List => {
            let state = load_state(&LocalStore::open()?, config);
            let badges: Vec<_> = RULES
                .iter()
                .map(|rule| {
                    json!({
                        "id": rule.id,
                        "title": rule.title,
                        "description": rule.description,
                        "earned": state.achievements.is_earned(rule.id),
                    })
                })
                .collect();
            print_json(&badges)?;
        }
    }
    Ok(())
}
