use clap::Subcommand;
use quickease_core::{BackendClient, Config, LocalStore, StudySession};

use super::{finish_session, load_state, CliResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Exchange credentials for a token pair and start a session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Drop the stored tokens and all cached user data
    Logout,
    /// Check authentication status
    Status,
}

pub async fn run(action: AuthAction, config: &Config) -> CliResult {
    match action {
        AuthAction::Login { username, password } => {
            let local = LocalStore::open()?;
            let client = BackendClient::new(&config.backend.base_url)?;
            let tokens = client.login(&username, &password).await?;
            local.save_auth_tokens(&tokens)?;

            let session = StudySession::open(client, config.timer.clone(), Some(local)).await?;
            println!(
                "logged in as {username} ({} badges earned)",
                session.achievements().earned().len()
            );
            finish_session(session, None)?;
        }
        AuthAction::Logout => {
            let local = LocalStore::open()?;
            let state = load_state(&local, config);
            let client = BackendClient::new(&config.backend.base_url)?;
            StudySession::from_state(client, state)
                .with_local_cache(local)
                .logout()?;
            println!("logged out");
        }
        AuthAction::Status => {
            let local = LocalStore::open()?;
            let status = if local.auth_tokens()?.is_some() {
                "authenticated"
            } else {
                "not authenticated"
            };
            println!("{status}");
        }
    }
    Ok(())
}
