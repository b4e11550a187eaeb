//! Error types for the attendance engine.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{EventKey, Role};

#[derive(Debug, Error)]
pub enum Error {
    #[error("required table `{table}` not found at {}", path.display())]
    MissingFile { table: &'static str, path: PathBuf },

    #[error("table `{table}` has no `{column}` column")]
    Schema {
        table: &'static str,
        column: &'static str,
    },

    #[error("hour {hour} of {course_id} on {date} already has attendance recorded")]
    DuplicateSlot {
        course_id: String,
        date: NaiveDate,
        hour: u8,
    },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{action} is not permitted for role {role}")]
    Forbidden { action: &'static str, role: Role },

    #[error("unknown course: {0}")]
    UnknownCourse(String),

    #[error("no attendance record for {0}")]
    EventNotFound(EventKey),

    #[error("no exemption at index {0}")]
    ExemptionNotFound(usize),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
