pub mod paths;
pub mod settings;

pub use paths::PathManager;
pub use settings::{Settings, SettingsError};

/// Load environment variables from .env files.
/// First loads from ~/.env (home directory), then from ./.env (project directory).
/// Project directory values take precedence over home directory values.
/// Call this before parsing CLI args to ensure env vars are available.
pub fn load_env_file() {
    // Load from home directory first (lower precedence)
    if let Some(dirs) = directories::UserDirs::new() {
        dotenv::from_path(dirs.home_dir().join(".env")).ok();
    }

    // Load from project directory
    dotenv::dotenv().ok();
}
