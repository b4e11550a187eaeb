//! Column layout of every table kept by the record store.
//!
//! Each [`Table`] names its file, its canonical column order (also the order rows are written in)
//! and the key columns without which no row can be read. Tables whose files drift over time are
//! read through the raw string rows in this module and then validated row by row.

use chrono::NaiveDate;
use csv::StringRecord;
use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{AttendanceEvent, ExemptionInterval, Status};

/// Hour value recorded for an extra session outside the timetable.
pub const EXTRA_HOUR: u8 = 0;

/// The timetabled hours of a day.
pub const REGULAR_HOURS: std::ops::RangeInclusive<u8> = 1..=6;

#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    pub file: &'static str,
    pub columns: &'static [&'static str],
    pub key_columns: &'static [&'static str],
    /// A missing primary table is fatal. A missing optional table reads as empty.
    pub primary: bool,
}

pub const STUDENTS: Table = Table {
    name: "students",
    file: "students.csv",
    columns: &["student_id", "name", "major_course"],
    key_columns: &["student_id"],
    primary: true,
};

pub const TEACHERS: Table = Table {
    name: "teachers",
    file: "teachers.csv",
    columns: &[
        "teacher_id",
        "name",
        "role",
        "department",
        "email",
        "password",
    ],
    key_columns: &["teacher_id", "role"],
    primary: true,
};

pub const COURSES: Table = Table {
    name: "courses",
    file: "courses.csv",
    columns: &["course_id", "teacher_id"],
    key_columns: &["course_id"],
    primary: true,
};

pub const ENROLLMENT: Table = Table {
    name: "enrollment",
    file: "enrollment.csv",
    columns: &["student_id", "course_id"],
    key_columns: &["student_id", "course_id"],
    primary: false,
};

pub const ATTENDANCE: Table = Table {
    name: "attendance",
    file: "attendance.csv",
    columns: &[
        "date",
        "hour",
        "course_id",
        "student_id",
        "status",
        "marked_by",
        "extra_time",
        "duration",
    ],
    key_columns: &[],
    primary: false,
};

pub const EXEMPTIONS: Table = Table {
    name: "camp_days",
    file: "camp_days.csv",
    columns: &["student_id", "start_date", "end_date", "activity"],
    key_columns: &["student_id", "start_date", "end_date"],
    primary: false,
};

/// The one-row-per-student course selection upload.
pub const COURSE_SELECTION: Table = Table {
    name: "course_selection",
    file: "student_course_selection.csv",
    columns: &["student_id", "major_course", "minor1", "minor2", "mdc", "vac"],
    key_columns: &["student_id"],
    primary: false,
};

impl Table {
    pub fn header_record(&self) -> StringRecord {
        StringRecord::from(self.columns.to_vec())
    }

    /// Fails if a key column is absent. Other absent columns are read as empty.
    pub fn check_headers(&self, headers: &StringRecord) -> Result<()> {
        let has = |column: &str| headers.iter().any(|h| h.trim() == column);

        if let Some(column) = self.key_columns.iter().find(|column| !has(column)) {
            return Err(Error::Schema {
                table: self.name,
                column,
            });
        }

        for column in self.columns.iter().filter(|column| !has(column)) {
            warn!(table = self.name, column, "column missing, reading it as empty");
        }

        Ok(())
    }
}

/// Older attendance files were written without a usable header. When `student_id` is absent but
/// the column count matches, the columns are taken in canonical order.
pub fn reconcile_attendance_headers(headers: &StringRecord) -> Option<StringRecord> {
    let has_student_id = headers.iter().any(|h| h.trim() == "student_id");
    if !has_student_id && headers.len() == ATTENDANCE.columns.len() {
        warn!(
            table = ATTENDANCE.name,
            "no `student_id` header, reading columns positionally"
        );
        Some(ATTENDANCE.header_record())
    } else {
        None
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    let day = trimmed
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| Error::Validation(format!("invalid date '{trimmed}': {e}")))
}

/// Parses an hour slot, tolerating the `1.0` form float columns are written in.
pub fn parse_hour(input: &str) -> Result<u8> {
    let trimmed = input.trim();
    let hour = match trimmed.parse::<u8>() {
        Ok(hour) => Some(hour),
        Err(_) => trimmed
            .parse::<f64>()
            .ok()
            .filter(|h| h.fract() == 0.0 && *h >= 0.0 && *h <= f64::from(u8::MAX))
            .map(|h| h as u8),
    };

    match hour {
        Some(hour) if hour == EXTRA_HOUR || REGULAR_HOURS.contains(&hour) => Ok(hour),
        _ => Err(Error::Validation(format!("invalid hour '{trimmed}'"))),
    }
}

fn required<'a>(value: &'a str, column: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(Error::Validation(format!("empty `{column}`")))
    } else {
        Ok(value)
    }
}

/// A row of the attendance table as written on disk.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AttendanceRecord {
    date: String,
    hour: String,
    course_id: String,
    student_id: String,
    status: String,
    marked_by: String,
    extra_time: String,
    duration: String,
}

impl AttendanceRecord {
    pub fn into_event(self) -> Result<AttendanceEvent> {
        // A reconciled `status` column is empty, which reads as the default status.
        let status = match self.status.trim() {
            "" => Status::default(),
            code => code.parse::<Status>().map_err(Error::Validation)?,
        };

        Ok(AttendanceEvent {
            date: parse_date(required(&self.date, "date")?)?,
            hour: parse_hour(required(&self.hour, "hour")?)?,
            course_id: required(&self.course_id, "course_id")?.to_string(),
            student_id: required(&self.student_id, "student_id")?.to_string(),
            status,
            marked_by: self.marked_by.trim().to_string(),
            extra_time: self.extra_time.trim().to_string(),
            duration: self.duration.trim().to_string(),
        })
    }
}

/// A row of the camp days table as written on disk.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExemptionRecord {
    student_id: String,
    start_date: String,
    end_date: String,
    #[serde(alias = "camp_type")]
    activity: String,
}

impl ExemptionRecord {
    pub fn into_interval(self) -> Result<ExemptionInterval> {
        Ok(ExemptionInterval {
            student_id: required(&self.student_id, "student_id")?.to_string(),
            start_date: parse_date(required(&self.start_date, "start_date")?)?,
            end_date: parse_date(required(&self.end_date, "end_date")?)?,
            activity: self.activity.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_dates_with_trailing_time() {
        assert_eq!(parse_date("2024-01-10").unwrap(), date(2024, 1, 10));
        assert_eq!(parse_date("2024-01-10 00:00:00").unwrap(), date(2024, 1, 10));
        assert!(matches!(parse_date("10/01/2024"), Err(Error::Validation(_))));
    }

    #[test]
    fn parses_integral_float_hours() {
        assert_eq!(parse_hour("3").unwrap(), 3);
        assert_eq!(parse_hour("0.0").unwrap(), EXTRA_HOUR);
        assert!(parse_hour("7").is_err());
        assert!(parse_hour("2.5").is_err());
        assert!(parse_hour("-1").is_err());
    }

    #[test]
    fn missing_key_column_is_a_schema_error() {
        let headers = StringRecord::from(vec!["name", "major_course"]);
        let err = STUDENTS.check_headers(&headers).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema {
                table: "students",
                column: "student_id"
            }
        ));
    }

    #[test]
    fn missing_optional_column_is_tolerated() {
        let headers = StringRecord::from(vec!["date", "hour", "course_id", "student_id"]);
        assert!(ATTENDANCE.check_headers(&headers).is_ok());
    }

    #[test]
    fn headerless_attendance_is_read_positionally() {
        let headers = StringRecord::from(vec![
            "2024-01-10", "1", "C1", "S1", "P", "T1", "", "",
        ]);
        let reconciled = reconcile_attendance_headers(&headers).unwrap();
        assert_eq!(reconciled, ATTENDANCE.header_record());

        let named = ATTENDANCE.header_record();
        assert!(reconcile_attendance_headers(&named).is_none());
    }

    #[test]
    fn empty_status_reads_as_present() {
        let record = AttendanceRecord {
            date: "2024-01-10".into(),
            hour: "1".into(),
            course_id: "C1".into(),
            student_id: "S1".into(),
            ..Default::default()
        };
        assert_eq!(record.into_event().unwrap().status, Status::Present);
    }

    #[test]
    fn record_without_student_is_rejected() {
        let record = AttendanceRecord {
            date: "2024-01-10".into(),
            hour: "1".into(),
            course_id: "C1".into(),
            status: "A".into(),
            ..Default::default()
        };
        assert!(matches!(record.into_event(), Err(Error::Validation(_))));
    }
}
