//! Per-student attendance totals over a date range.

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use crate::exemption::ExemptSet;
use crate::models::{AttendanceEvent, DateRange, ReportRow, StatusSummaryRow, Student};

/// Keeps the events that fall inside `range` and are not exempted.
pub fn counted_events<'a>(
    events: &'a [AttendanceEvent],
    exempt: &ExemptSet,
    range: DateRange,
) -> Vec<&'a AttendanceEvent> {
    let in_range = events.iter().filter(|event| range.contains(event.date));

    let mut dropped = 0usize;
    let counted: Vec<_> = in_range
        .filter(|event| {
            let keep = !exempt.is_exempt(&event.student_id, event.date);
            dropped += usize::from(!keep);
            keep
        })
        .collect();

    debug!(
        kept = counted.len(),
        exempted = dropped,
        "filtered attendance events"
    );
    counted
}

/// `attended / total * 100` rounded to one decimal with ties to even, `0.0` when nothing was
/// counted.
pub fn percent(attended: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = attended as f64 / total as f64 * 100.0;
    (raw * 10.0).round_ties_even() / 10.0
}

/// Computes one row per student in `students`, sorted by student ID.
///
/// Students without any counted events still get a row with zero totals. Events of students not
/// in `students` are ignored. An inverted `range` yields no rows.
pub fn aggregate(
    students: &[Student],
    events: &[AttendanceEvent],
    exempt: &ExemptSet,
    range: DateRange,
) -> Vec<ReportRow> {
    if range.is_empty() {
        return Vec::new();
    }

    let mut tallies: HashMap<&str, (usize, usize)> = HashMap::new();
    for event in counted_events(events, exempt, range) {
        let (total, attended) = tallies.entry(event.student_id.as_str()).or_default();
        *total += 1;
        *attended += usize::from(event.status.is_attended());
    }

    let mut seen = HashSet::new();
    let mut rows: Vec<ReportRow> = students
        .iter()
        .filter(|student| seen.insert(student.student_id.as_str()))
        .map(|student| {
            let (total, attended) = tallies
                .get(student.student_id.as_str())
                .copied()
                .unwrap_or_default();
            ReportRow {
                student_id: student.student_id.clone(),
                name: student.name.clone(),
                total,
                attended,
                percent: percent(attended, total),
            }
        })
        .collect();

    rows.sort_by(|a, b| a.student_id.cmp(&b.student_id));
    rows
}

/// Counts every status per student across all of `events`.
pub fn status_summary(events: &[AttendanceEvent]) -> Vec<StatusSummaryRow> {
    let mut summary: BTreeMap<&str, StatusSummaryRow> = BTreeMap::new();
    for event in events {
        summary
            .entry(event.student_id.as_str())
            .or_insert_with(|| StatusSummaryRow {
                student_id: event.student_id.clone(),
                ..Default::default()
            })
            .count(event.status);
    }
    summary.into_values().collect()
}

/// Rows of students with at least one counted session whose percentage is below `threshold`.
pub fn at_risk(rows: &[ReportRow], threshold: f64) -> Vec<&ReportRow> {
    rows.iter()
        .filter(|row| row.total > 0 && row.percent < threshold)
        .collect()
}
