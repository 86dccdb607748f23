mod config;
pub mod local;

pub use config::{BackendConfig, Config, LoggingConfig, UiConfig};
pub use local::LocalStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `QUICKEASE_DATA_DIR` wins when set. Otherwise `~/.config/quickease/`,
/// or `~/.config/quickease-dev/` with `QUICKEASE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("QUICKEASE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("QUICKEASE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("quickease-dev")
            } else {
                base_dir.join("quickease")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
