//! Prepares a data directory.
//!
//! Creates the enrollment, attendance and camp days tables with only their header rows if they do
//! not exist yet, then checks that the primary tables (students, teachers, courses) are readable.

use anyhow::{Context, Result};
use attendance::{AttendanceManager, CsvStore, Settings};
use std::path::Path;

pub fn main() -> Result<()> {
    let settings = Settings::load(Path::new("config.toml")).context("failed to read config.toml")?;
    let store = CsvStore::new(&settings.attendance_manager.data_dir);

    let created = store.initialize()?;
    if created.is_empty() {
        println!("All optional tables already exist in {}.", store.dir().display());
    } else {
        println!("Created {} in {}.", created.join(", "), store.dir().display());
    }

    AttendanceManager::open(store).context("primary tables are missing or unreadable")?;
    println!("Students, teachers and courses are readable.");

    Ok(())
}
