use anyhow::{Context, Result};

pub mod aggregate;
pub mod cli;
pub mod display;
pub mod error;
pub mod exemption;
pub mod export;
pub mod manager;
pub mod models;
pub mod recorder;
pub mod roster;
pub mod schema;
pub mod session;
pub mod settings;
pub mod slots;
pub mod store;

pub use crate::error::Error;
pub use crate::manager::{AttendanceManager, ReportScope};
pub use crate::settings::Settings;
pub use crate::store::{CsvStore, RecordStore};

/// Opens the CSV tables in the configured data directory.
pub fn create_manager(settings: &Settings) -> Result<AttendanceManager<CsvStore>> {
    let data_dir = &settings.attendance_manager.data_dir;
    AttendanceManager::open(CsvStore::new(data_dir))
        .with_context(|| format!("failed to open attendance data in {}", data_dir.display()))
}
