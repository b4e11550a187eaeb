//! Expansion of camp/activity exemption intervals into exempted `(student, date)` pairs.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::warn;

use crate::models::{DateRange, ExemptionInterval};

fn is_inverted(interval: &ExemptionInterval) -> bool {
    let inverted = interval.start_date > interval.end_date;
    if inverted {
        warn!(
            student_id = %interval.student_id,
            start = %interval.start_date,
            end = %interval.end_date,
            "exemption ends before it starts, ignoring it"
        );
    }
    inverted
}

/// The set of `(student, date)` pairs excluded from attendance accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExemptSet {
    pairs: HashSet<(String, NaiveDate)>,
}

impl ExemptSet {
    /// Materializes every day of every interval. Overlapping or duplicated intervals collapse.
    pub fn from_intervals<'a, I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = &'a ExemptionInterval>,
    {
        let mut set = Self::default();
        for interval in intervals {
            set.insert_interval(interval);
        }
        set
    }

    /// Like [`ExemptSet::from_intervals`], but only materializes the days inside `range`.
    pub fn within<'a, I>(intervals: I, range: DateRange) -> Self
    where
        I: IntoIterator<Item = &'a ExemptionInterval>,
    {
        let mut set = Self::default();
        for interval in intervals {
            if is_inverted(interval) {
                continue;
            }
            let start = interval.start_date.max(range.from);
            let end = interval.end_date.min(range.to);
            set.insert_days(&interval.student_id, start, end);
        }
        set
    }

    pub fn insert_interval(&mut self, interval: &ExemptionInterval) {
        if !is_inverted(interval) {
            self.insert_days(&interval.student_id, interval.start_date, interval.end_date);
        }
    }

    /// Every day from `start` to `end`, both included.
    fn insert_days(&mut self, student_id: &str, start: NaiveDate, end: NaiveDate) {
        self.pairs.extend(
            start
                .iter_days()
                .take_while(|day| *day <= end)
                .map(|day| (student_id.to_string(), day)),
        );
    }

    pub fn is_exempt(&self, student_id: &str, date: NaiveDate) -> bool {
        self.pairs.contains(&(student_id.to_string(), date))
    }

    pub fn union(mut self, other: &ExemptSet) -> Self {
        self.pairs.extend(other.pairs.iter().cloned());
        self
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
