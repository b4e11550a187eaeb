//! Submission of one hour's attendance for a course.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{AttendanceEvent, Status, Student};
use crate::schema::{EXTRA_HOUR, REGULAR_HOURS};
use crate::slots;
use crate::store::RecordStore;

/// One hour of attendance for a course, as entered by a teacher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub course_id: String,
    pub date: NaiveDate,
    /// `1..=6`, or `0` for an extra session.
    pub hour: u8,
    /// Statuses that differ from the default. Enrolled students not listed are marked present.
    pub marks: HashMap<String, Status>,
    /// Start time of an extra session. Ignored for timetabled hours.
    pub extra_time: String,
    pub duration: String,
}

impl Submission {
    pub fn new(course_id: impl Into<String>, date: NaiveDate, hour: u8) -> Self {
        Self {
            course_id: course_id.into(),
            date,
            hour,
            marks: HashMap::new(),
            extra_time: String::new(),
            duration: String::new(),
        }
    }

    pub fn mark(mut self, student_id: impl Into<String>, status: Status) -> Self {
        self.marks.insert(student_id.into(), status);
        self
    }

    pub fn extra(mut self, start: impl Into<String>, duration: impl Into<String>) -> Self {
        self.extra_time = start.into();
        self.duration = duration.into();
        self
    }
}

/// Students on the roster who are enrolled in `course_id`, in roster order.
pub fn class_list<S: RecordStore>(store: &S, course_id: &str) -> Result<Vec<Student>> {
    let enrolled: HashSet<String> = store
        .enrollment()?
        .into_iter()
        .filter(|enrollment| enrollment.course_id == course_id)
        .map(|enrollment| enrollment.student_id)
        .collect();

    let mut seen = HashSet::new();
    Ok(store
        .students()?
        .into_iter()
        .filter(|student| enrolled.contains(&student.student_id))
        .filter(|student| seen.insert(student.student_id.clone()))
        .collect())
}

/// Appends one event per enrolled student and returns how many were appended.
///
/// Enrollment and existing attendance are read fresh. A timetabled hour that already has
/// attendance for the course and date is rejected with [`Error::DuplicateSlot`]; extra sessions
/// are never rejected this way. The batch is written as a single table replacement, so either
/// every row lands or none does. Existing rows, readable or not, are written back unchanged.
pub fn submit<S: RecordStore>(
    store: &S,
    submission: &Submission,
    recorder_id: &str,
) -> Result<usize> {
    let hour = submission.hour;
    if hour != EXTRA_HOUR && !REGULAR_HOURS.contains(&hour) {
        return Err(Error::Validation(format!(
            "hour must be between 1 and 6, or 0 for an extra session, got {hour}"
        )));
    }

    let students = class_list(store, &submission.course_id)?;
    if students.is_empty() {
        return Err(Error::Validation(format!(
            "no students are enrolled in {}",
            submission.course_id
        )));
    }

    for student_id in submission.marks.keys() {
        if !students.iter().any(|s| &s.student_id == student_id) {
            warn!(
                student_id = %student_id,
                course_id = %submission.course_id,
                "ignoring mark for a student not enrolled in the course"
            );
        }
    }

    let (extra_time, duration) = if hour == EXTRA_HOUR {
        (submission.extra_time.trim(), submission.duration.trim())
    } else {
        ("", "")
    };

    let appended = store.update_attendance(|events| {
        if hour != EXTRA_HOUR
            && slots::taken_hours(events.as_slice(), &submission.course_id, submission.date)
                .contains(&hour)
        {
            return Err(Error::DuplicateSlot {
                course_id: submission.course_id.clone(),
                date: submission.date,
                hour,
            });
        }

        let existing = events.len();
        events.extend(students.into_iter().map(|student| AttendanceEvent {
            date: submission.date,
            hour,
            course_id: submission.course_id.clone(),
            status: submission
                .marks
                .get(&student.student_id)
                .copied()
                .unwrap_or_default(),
            student_id: student.student_id,
            marked_by: recorder_id.to_string(),
            extra_time: extra_time.to_string(),
            duration: duration.to_string(),
        }));
        Ok(events.len() - existing)
    })?;

    info!(
        course_id = %submission.course_id,
        date = %submission.date,
        hour,
        appended,
        "attendance recorded"
    );
    Ok(appended)
}
