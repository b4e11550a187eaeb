//! The course-selection import and department scoping of the student roster.

use serde::Deserialize;
use std::io::Read;
use tracing::warn;

use crate::error::Result;
use crate::models::{Enrollment, Role, Student};
use crate::schema::COURSE_SELECTION;
use crate::session::Session;
use crate::store;

/// One row of the course-selection upload: every course a student takes, one column per type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CourseSelection {
    pub student_id: String,
    pub major_course: Option<String>,
    pub minor1: Option<String>,
    pub minor2: Option<String>,
    pub mdc: Option<String>,
    pub vac: Option<String>,
}

impl CourseSelection {
    /// The non-empty course columns, in column order.
    pub fn courses(&self) -> impl Iterator<Item = &str> {
        [
            &self.major_course,
            &self.minor1,
            &self.minor2,
            &self.mdc,
            &self.vac,
        ]
        .into_iter()
        .flatten()
        .map(|course| course.trim())
        .filter(|course| !course.is_empty())
    }
}

/// Unpivots the one-row-per-student selection into one enrollment row per student per course.
pub fn reshape(rows: &[CourseSelection]) -> Vec<Enrollment> {
    rows.iter()
        .flat_map(|row| {
            row.courses().map(|course_id| Enrollment {
                student_id: row.student_id.trim().to_string(),
                course_id: course_id.to_string(),
            })
        })
        .collect()
}

/// Reads a course-selection upload. Rows that fail to parse or have no student are skipped.
///
/// Returns the rows and how many were skipped.
pub fn read_course_selection<R: Read>(source: R) -> Result<(Vec<CourseSelection>, usize)> {
    let (rows, mut skipped) = store::read_upload::<CourseSelection, _>(&COURSE_SELECTION, source)?;

    let rows = rows
        .into_iter()
        .filter(|row| {
            let has_student = !row.student_id.trim().is_empty();
            if !has_student {
                warn!("skipping course selection row without a student_id");
                skipped += 1;
            }
            has_student
        })
        .collect();

    Ok((rows, skipped))
}

/// The students a session reports on: a department admin sees their department's students, an
/// admin sees everyone.
pub fn department_students(students: Vec<Student>, session: &Session) -> Vec<Student> {
    match session.role {
        Role::DeptAdmin if !session.department.is_empty() => students
            .into_iter()
            .filter(|student| student.program == session.department)
            .collect(),
        _ => students,
    }
}
