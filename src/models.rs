//! Record types for the tables kept by the [`RecordStore`](crate::store::RecordStore), plus the
//! derived rows produced by reports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::schema::EXTRA_HOUR;

/// A student on the roster. Maintained by an external roster process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    #[serde(default)]
    pub name: String,
    /// The primary program affiliation, used for department scoping.
    #[serde(rename = "major_course", default)]
    pub program: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Teacher,
    DeptAdmin,
    Admin,
}

impl Role {
    /// Whether this role may manage exemptions, corrections, imports and department reports.
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::DeptAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self {
            Role::Teacher => "teacher",
            Role::DeptAdmin => "dept_admin",
            Role::Admin => "admin",
        };
        f.write_str(role)
    }
}

/// A staff account.
///
/// Passwords are stored and compared in plaintext. Integrators must not expose the teachers table
/// outside a trusted machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub teacher_id: String,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: String,
    #[serde(default)]
    pub teacher_id: String,
}

/// One `(student, course)` membership. A student has one row per course they take.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: String,
    pub course_id: String,
}

/// The attendance status recorded for one student in one session.
///
/// Every status other than [`Status::Absent`] is sanctioned presence and counts as attended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "P")]
    Present,
    #[serde(rename = "A")]
    Absent,
    #[serde(rename = "NSS")]
    NssDuty,
    #[serde(rename = "NCC")]
    NccDuty,
    #[serde(rename = "Club")]
    ClubDuty,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Present,
        Status::Absent,
        Status::NssDuty,
        Status::NccDuty,
        Status::ClubDuty,
    ];

    /// The code stored in the attendance table.
    pub fn code(self) -> &'static str {
        match self {
            Status::Present => "P",
            Status::Absent => "A",
            Status::NssDuty => "NSS",
            Status::NccDuty => "NCC",
            Status::ClubDuty => "Club",
        }
    }

    pub fn is_attended(self) -> bool {
        self != Status::Absent
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "present" => Ok(Status::Present),
            "a" | "absent" => Ok(Status::Absent),
            "nss" => Ok(Status::NssDuty),
            "ncc" => Ok(Status::NccDuty),
            "club" => Ok(Status::ClubDuty),
            other => Err(format!("unknown attendance status '{other}'")),
        }
    }
}

/// A single recorded attendance mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceEvent {
    pub date: NaiveDate,
    /// `1..=6` for a timetabled hour, `0` for an extra session.
    pub hour: u8,
    pub course_id: String,
    pub student_id: String,
    pub status: Status,
    pub marked_by: String,
    /// Free-text start time; empty unless `hour` is `0`.
    pub extra_time: String,
    pub duration: String,
}

impl AttendanceEvent {
    pub fn key(&self) -> EventKey {
        EventKey {
            date: self.date,
            course_id: self.course_id.clone(),
            student_id: self.student_id.clone(),
            hour: self.hour,
            extra_time: self.extra_time.clone(),
            duration: self.duration.clone(),
        }
    }
}

/// Identifies the attendance row targeted by an administrative correction.
///
/// A timetabled hour is identified by date, course, student and hour. Several extra sessions can
/// share those, so for hour `0` the start time and duration are part of the key as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub date: NaiveDate,
    pub course_id: String,
    pub student_id: String,
    pub hour: u8,
    /// Only compared for extra sessions.
    pub extra_time: String,
    pub duration: String,
}

impl EventKey {
    pub fn matches(&self, event: &AttendanceEvent) -> bool {
        event.date == self.date
            && event.hour == self.hour
            && event.course_id == self.course_id
            && event.student_id == self.student_id
            && (self.hour != EXTRA_HOUR
                || (event.extra_time == self.extra_time.trim()
                    && event.duration == self.duration.trim()))
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hour == EXTRA_HOUR {
            write!(
                f,
                "{} {} extra session {} {} for {}",
                self.date, self.course_id, self.extra_time, self.duration, self.student_id
            )
        } else {
            write!(
                f,
                "{} {} hour {} for {}",
                self.date, self.course_id, self.hour, self.student_id
            )
        }
    }
}

/// A closed date range during which a student is excused from attendance accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExemptionInterval {
    pub student_id: String,
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    pub activity: String,
}

/// One line of a consolidated attendance report. Derived on every query, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub student_id: String,
    pub name: String,
    pub total: usize,
    pub attended: usize,
    pub percent: f64,
}

/// An attendance event joined with the student it belongs to, for the detailed log export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRow {
    pub date: NaiveDate,
    pub hour: u8,
    pub course_id: String,
    pub student_id: String,
    pub status: Status,
    pub marked_by: String,
    pub extra_time: String,
    pub duration: String,
    pub name: String,
    pub major_course: String,
}

/// Count of every status recorded for a student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummaryRow {
    pub student_id: String,
    #[serde(rename = "P")]
    pub present: usize,
    #[serde(rename = "A")]
    pub absent: usize,
    #[serde(rename = "NSS")]
    pub nss: usize,
    #[serde(rename = "NCC")]
    pub ncc: usize,
    #[serde(rename = "Club")]
    pub club: usize,
}

impl StatusSummaryRow {
    pub fn count(&mut self, status: Status) {
        let slot = match status {
            Status::Present => &mut self.present,
            Status::Absent => &mut self.absent,
            Status::NssDuty => &mut self.nss,
            Status::NccDuty => &mut self.ncc,
            Status::ClubDuty => &mut self.club,
        };
        *slot += 1;
    }
}

/// A date range, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_codes_and_names() {
        assert_eq!("P".parse::<Status>(), Ok(Status::Present));
        assert_eq!("absent".parse::<Status>(), Ok(Status::Absent));
        assert_eq!(" ncc ".parse::<Status>(), Ok(Status::NccDuty));
        assert_eq!("CLUB".parse::<Status>(), Ok(Status::ClubDuty));
        assert!("late".parse::<Status>().is_err());
    }

    #[test]
    fn only_absent_is_not_attended() {
        for status in Status::ALL {
            assert_eq!(status.is_attended(), status != Status::Absent);
        }
    }

    fn event(hour: u8, extra_time: &str) -> AttendanceEvent {
        AttendanceEvent {
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            hour,
            course_id: "C1".to_string(),
            student_id: "S1".to_string(),
            status: Status::Present,
            marked_by: "T1".to_string(),
            extra_time: extra_time.to_string(),
            duration: if extra_time.is_empty() { "" } else { "1 hour" }.to_string(),
        }
    }

    #[test]
    fn extra_session_keys_include_the_start_time() {
        let morning = event(EXTRA_HOUR, "9:00 AM");
        let evening = event(EXTRA_HOUR, "4:00 PM");

        assert!(morning.key().matches(&morning));
        assert!(!morning.key().matches(&evening));
    }

    #[test]
    fn timetabled_keys_ignore_extra_fields() {
        let mut key = event(2, "").key();
        key.extra_time = "4:00 PM".to_string();
        assert!(key.matches(&event(2, "")));
        assert!(!key.matches(&event(3, "")));
    }
}
