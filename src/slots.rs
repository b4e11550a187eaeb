//! Which hour slots of a course have already been taken on a given day.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::models::AttendanceEvent;
use crate::schema::REGULAR_HOURS;

/// Returns the timetabled hours (`1..=6`) for which attendance exists for `course_id` on `date`.
///
/// Extra sessions (hour `0`) are never reported, so they never block another extra session.
pub fn taken_hours(events: &[AttendanceEvent], course_id: &str, date: NaiveDate) -> BTreeSet<u8> {
    events
        .iter()
        .filter(|event| event.course_id == course_id && event.date == date)
        .map(|event| event.hour)
        .filter(|hour| REGULAR_HOURS.contains(hour))
        .collect()
}

/// The timetabled hours still open for submission. The extra hour is always available on top.
pub fn available_hours(taken: &BTreeSet<u8>) -> Vec<u8> {
    REGULAR_HOURS.filter(|hour| !taken.contains(hour)).collect()
}
