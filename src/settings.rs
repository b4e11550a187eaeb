//! Configuration loaded from `config.toml` and `ATTENDANCE`-prefixed environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub attendance_manager: ManagerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManagerSettings {
    /// Directory holding the CSV tables.
    pub data_dir: PathBuf,
    /// Attendance percentage under which a student is flagged as at risk.
    pub warning_percent: f64,
}

impl Settings {
    /// Reads `path` if it exists, then environment overrides, on top of the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Config::builder()
            .set_default("attendance_manager.data_dir", ".")?
            .set_default("attendance_manager.warning_percent", 75.0)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("ATTENDANCE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
