mod config;

pub use config::{Config, ConfigError, OutputConfig, PortalConfig, SyncConfig};

use std::path::PathBuf;

/// Returns `~/.config/glucosync[-dev]/` based on GLUCOSYNC_ENV.
///
/// Set GLUCOSYNC_ENV=dev to use a separate development data directory.
/// Creates the directory on first use.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("GLUCOSYNC_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("glucosync-dev")
    } else {
        base_dir.join("glucosync")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
