//! Where subchat keeps its database, config and logs

use std::path::PathBuf;
use std::sync::OnceLock;

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Fix the data directory for the rest of the process
///
/// `None` selects `~/.subchat`. Only the first call takes effect.
pub fn init_data_dir(custom_path: Option<PathBuf>) {
    let path = custom_path.unwrap_or_else(default_data_dir);
    if let Err(rejected) = DATA_DIR.set(path) {
        tracing::debug!(
            rejected = %rejected.display(),
            current = %data_dir().display(),
            "Data directory already set"
        );
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".subchat")
}

pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(default_data_dir)
}

pub fn database_path() -> PathBuf {
    data_dir().join("subchat.db")
}

pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

pub fn log_file_path() -> PathBuf {
    logs_dir().join("subchat.log")
}

pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}
