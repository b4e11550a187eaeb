use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Read;
use tracing::info;

use chrono::NaiveDate;

use crate::aggregate;
use crate::error::{Error, Result};
use crate::exemption::ExemptSet;
use crate::models::{
    AttendanceEvent, Course, DateRange, EventKey, ExemptionInterval, LogRow, ReportRow, Status,
    StatusSummaryRow, Student,
};
use crate::recorder::{self, Submission};
use crate::roster;
use crate::session::{self, Session};
use crate::slots;
use crate::store::RecordStore;

/// Which students and events a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportScope {
    /// The session's department (everyone for an admin), counting every course they attend.
    #[default]
    Department,
    /// Students enrolled in the session teacher's courses, counting only those courses.
    TaughtCourses,
}

/// Outcome of a course-selection import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub students: usize,
    pub enrollments: usize,
    pub skipped: usize,
}

/// The manager for recording, correcting, and reporting attendance data.
///
/// Every operation reads the tables it needs fresh from the store, and every operation that
/// depends on who is asking takes the caller's [`Session`].
pub struct AttendanceManager<S> {
    store: S,
}

impl<S: RecordStore> AttendanceManager<S> {
    /// Wraps a store, failing if any primary table (students, teachers, courses) is unreadable.
    pub fn open(store: S) -> Result<Self> {
        store.students()?;
        store.teachers()?;
        store.courses()?;
        Ok(Self { store })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Session> {
        let session = session::authenticate(&self.store.teachers()?, email, password)?;
        info!(teacher_id = %session.teacher_id, role = %session.role, "logged in");
        Ok(session)
    }

    /// The courses the session's teacher is assigned to.
    pub fn assigned_courses(&self, session: &Session) -> Result<Vec<Course>> {
        Ok(self
            .store
            .courses()?
            .into_iter()
            .filter(|course| course.teacher_id == session.teacher_id)
            .collect())
    }

    /// Students enrolled in `course_id`.
    pub fn class_list(&self, course_id: &str) -> Result<Vec<Student>> {
        recorder::class_list(&self.store, course_id)
    }

    /// Timetabled hours of `course_id` that already have attendance on `date`.
    pub fn taken_hours(&self, course_id: &str, date: NaiveDate) -> Result<BTreeSet<u8>> {
        Ok(slots::taken_hours(
            &self.store.attendance()?,
            course_id,
            date,
        ))
    }

    /// Timetabled hours still open for `course_id` on `date`. An extra session is always possible.
    pub fn available_hours(&self, course_id: &str, date: NaiveDate) -> Result<Vec<u8>> {
        Ok(slots::available_hours(&self.taken_hours(course_id, date)?))
    }

    /// Records one hour of attendance for a course the session's teacher is assigned to.
    pub fn submit(&self, session: &Session, submission: &Submission) -> Result<usize> {
        let assigned = self
            .assigned_courses(session)?
            .iter()
            .any(|course| course.course_id == submission.course_id);
        if !assigned {
            return Err(Error::UnknownCourse(submission.course_id.clone()));
        }

        recorder::submit(&self.store, submission, &session.teacher_id)
    }

    /// Overwrites the status of the attendance row matching `key`.
    pub fn edit_status(&self, session: &Session, key: &EventKey, status: Status) -> Result<()> {
        session.require_admin("editing attendance")?;

        let edited = self.store.update_attendance(|events| {
            let mut edited = 0usize;
            for event in events.iter_mut().filter(|event| key.matches(event)) {
                event.status = status;
                edited += 1;
            }
            if edited == 0 {
                return Err(Error::EventNotFound(key.clone()));
            }
            Ok(edited)
        })?;

        info!(%key, %status, edited, "attendance status corrected");
        Ok(())
    }

    /// Removes the attendance row matching `key`.
    pub fn delete_event(&self, session: &Session, key: &EventKey) -> Result<()> {
        session.require_admin("deleting attendance")?;

        let deleted = self.store.update_attendance(|events| {
            let before = events.len();
            events.retain(|event| !key.matches(event));
            match before - events.len() {
                0 => Err(Error::EventNotFound(key.clone())),
                deleted => Ok(deleted),
            }
        })?;

        info!(%key, deleted, "attendance deleted");
        Ok(())
    }

    /// Attendance rows recorded on `date`, for picking a row to correct.
    pub fn events_on(&self, session: &Session, date: NaiveDate) -> Result<Vec<AttendanceEvent>> {
        session.require_admin("browsing attendance")?;

        Ok(self
            .store
            .attendance()?
            .into_iter()
            .filter(|event| event.date == date)
            .collect())
    }

    pub fn add_exemption(&self, session: &Session, interval: ExemptionInterval) -> Result<()> {
        session.require_admin("managing camp days")?;

        let added = interval.clone();
        self.store.update_exemptions(|intervals| {
            intervals.push(interval);
            Ok(())
        })?;

        info!(
            student_id = %added.student_id,
            start = %added.start_date,
            end = %added.end_date,
            activity = %added.activity,
            "exemption added"
        );
        Ok(())
    }

    pub fn exemptions(&self, session: &Session) -> Result<Vec<ExemptionInterval>> {
        session.require_admin("managing camp days")?;
        self.store.exemptions()
    }

    /// Deletes the exemption at `index` (as listed by [`AttendanceManager::exemptions`]) and
    /// returns it.
    pub fn delete_exemption(&self, session: &Session, index: usize) -> Result<ExemptionInterval> {
        session.require_admin("managing camp days")?;

        let removed = self.store.update_exemptions(|intervals| {
            if index >= intervals.len() {
                return Err(Error::ExemptionNotFound(index));
            }
            Ok(intervals.remove(index))
        })?;

        info!(student_id = %removed.student_id, index, "exemption deleted");
        Ok(removed)
    }

    /// Replaces the whole enrollment table with the unpivoted course-selection upload.
    pub fn import_course_selection<R: Read>(
        &self,
        session: &Session,
        source: R,
    ) -> Result<ImportSummary> {
        session.require_admin("importing course selections")?;

        let (rows, skipped) = roster::read_course_selection(source)?;
        let enrollment = roster::reshape(&rows);
        self.store.replace_enrollment(&enrollment)?;

        let summary = ImportSummary {
            students: rows.len(),
            enrollments: enrollment.len(),
            skipped,
        };
        info!(
            students = summary.students,
            enrollments = summary.enrollments,
            skipped,
            "enrollment imported"
        );
        Ok(summary)
    }

    /// The consolidated attendance report for `range`.
    pub fn report(
        &self,
        session: &Session,
        range: DateRange,
        scope: ReportScope,
    ) -> Result<Vec<ReportRow>> {
        let (students, events) = self.scoped(session, scope)?;
        let exempt = ExemptSet::within(&self.store.exemptions()?, range);
        Ok(aggregate::aggregate(&students, &events, &exempt, range))
    }

    /// The events counted by [`AttendanceManager::report`], joined with their students.
    pub fn detailed_log(
        &self,
        session: &Session,
        range: DateRange,
        scope: ReportScope,
    ) -> Result<Vec<LogRow>> {
        let (students, events) = self.scoped(session, scope)?;
        let exempt = ExemptSet::within(&self.store.exemptions()?, range);
        let by_id: HashMap<&str, &Student> = students
            .iter()
            .map(|student| (student.student_id.as_str(), student))
            .collect();

        let mut rows: Vec<LogRow> = aggregate::counted_events(&events, &exempt, range)
            .into_iter()
            .filter_map(|event| {
                let student = by_id.get(event.student_id.as_str())?;
                Some(LogRow {
                    date: event.date,
                    hour: event.hour,
                    course_id: event.course_id.clone(),
                    student_id: event.student_id.clone(),
                    status: event.status,
                    marked_by: event.marked_by.clone(),
                    extra_time: event.extra_time.clone(),
                    duration: event.duration.clone(),
                    name: student.name.clone(),
                    major_course: student.program.clone(),
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            (a.date, &a.course_id, a.hour, &a.student_id)
                .cmp(&(b.date, &b.course_id, b.hour, &b.student_id))
        });
        Ok(rows)
    }

    /// Status counts per student over the whole attendance table.
    pub fn status_summary(&self, session: &Session) -> Result<Vec<StatusSummaryRow>> {
        session.require_admin("viewing the attendance summary")?;
        Ok(aggregate::status_summary(&self.store.attendance()?))
    }

    /// Report rows below `threshold` percent.
    pub fn at_risk(
        &self,
        session: &Session,
        range: DateRange,
        scope: ReportScope,
        threshold: f64,
    ) -> Result<Vec<ReportRow>> {
        let rows = self.report(session, range, scope)?;
        Ok(aggregate::at_risk(&rows, threshold)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Projects the roster and the attendance table down to what `scope` covers for `session`.
    fn scoped(
        &self,
        session: &Session,
        scope: ReportScope,
    ) -> Result<(Vec<Student>, Vec<AttendanceEvent>)> {
        let students = self.store.students()?;
        let events = self.store.attendance()?;

        match scope {
            ReportScope::Department => {
                session.require_admin("department reports")?;
                let students = roster::department_students(students, session);
                let events = {
                    let ids: HashSet<&str> =
                        students.iter().map(|s| s.student_id.as_str()).collect();
                    events
                        .into_iter()
                        .filter(|event| ids.contains(event.student_id.as_str()))
                        .collect()
                };
                Ok((students, events))
            }
            ReportScope::TaughtCourses => {
                let courses: HashSet<String> = self
                    .assigned_courses(session)?
                    .into_iter()
                    .map(|course| course.course_id)
                    .collect();
                let enrolled: HashSet<String> = self
                    .store
                    .enrollment()?
                    .into_iter()
                    .filter(|enrollment| courses.contains(&enrollment.course_id))
                    .map(|enrollment| enrollment.student_id)
                    .collect();

                let students = students
                    .into_iter()
                    .filter(|student| enrolled.contains(&student.student_id))
                    .collect();
                let events = events
                    .into_iter()
                    .filter(|event| courses.contains(&event.course_id))
                    .collect();
                Ok((students, events))
            }
        }
    }
}
