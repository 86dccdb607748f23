pub mod achievements;
pub mod auth;
pub mod completions;
pub mod config;
pub mod settings;
pub mod timer;

use quickease_core::{BackendClient, BackendError, Config, LocalStore, SessionState, StudySession};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Session state from the last invocation, or a fresh one built from the
/// configured timer settings.
pub fn load_state(local: &LocalStore, config: &Config) -> SessionState {
    match local.session_state::<SessionState>() {
        Ok(Some(state)) => state,
        Ok(None) => fresh_state(config),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable session state");
            fresh_state(config)
        }
    }
}

fn fresh_state(config: &Config) -> SessionState {
    SessionState {
        timer: quickease_core::TimerEngine::new(config.timer.clone()),
        ..SessionState::default()
    }
}

/// A client for the configured backend carrying the stored tokens.
pub fn client(config: &Config, local: &LocalStore) -> Result<BackendClient, Box<dyn std::error::Error>> {
    let tokens = local
        .auth_tokens()?
        .ok_or("not logged in, run `quickease-cli auth login` first")?;
    Ok(BackendClient::new(&config.backend.base_url)?.with_tokens(tokens))
}

/// Rebuild the logged-in session with its local cache attached.
pub fn open_session(
    config: &Config,
) -> Result<StudySession<BackendClient>, Box<dyn std::error::Error>> {
    let local = LocalStore::open()?;
    let backend = client(config, &local)?;
    let state = load_state(&local, config);
    Ok(StudySession::from_state(backend, state).with_local_cache(local))
}

/// Write session state and any refreshed tokens back to the cache.
///
/// An expired session is logged out instead.
pub fn finish_session(
    session: StudySession<BackendClient>,
    outcome: Option<&BackendError>,
) -> CliResult {
    if matches!(outcome, Some(BackendError::SessionExpired)) {
        session.logout()?;
        return Ok(());
    }
    session.persist()?;
    if let (Some(local), Some(tokens)) = (session.local(), session.backend().tokens()) {
        local.save_auth_tokens(&tokens)?;
    }
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
