#![allow(dead_code)]

use attendance::session::Session;
use attendance::{AttendanceManager, CsvStore};
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const STUDENTS: &str = "\
student_id,name,major_course
S1,Asha,PHY
S2,Bilal,PHY
S3,Chitra,CHE
";

pub const TEACHERS: &str = "\
teacher_id,name,role,department,email,password
T1,Teacher One,teacher,PHY,t1@college.edu,pass1
T2,Teacher Two,teacher,CHE,t2@college.edu,pass2
D1,Physics Head,dept_admin,PHY,head@college.edu,headpass
A1,Office,admin,,admin@college.edu,adminpass
";

pub const COURSES: &str = "\
course_id,teacher_id
C1,T1
C2,T2
";

pub const ENROLLMENT: &str = "\
student_id,course_id
S1,C1
S2,C1
S3,C2
S1,C2
";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn write(dir: &Path, file: &str, contents: &str) {
    fs::write(dir.join(file), contents).expect("write fixture");
}

/// A data directory with the primary tables and enrollment, but no attendance or camp days.
pub fn data_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "students.csv", STUDENTS);
    write(dir.path(), "teachers.csv", TEACHERS);
    write(dir.path(), "courses.csv", COURSES);
    write(dir.path(), "enrollment.csv", ENROLLMENT);
    dir
}

pub fn manager(dir: &TempDir) -> AttendanceManager<CsvStore> {
    AttendanceManager::open(CsvStore::new(dir.path())).expect("open manager")
}

pub fn login(manager: &AttendanceManager<CsvStore>, who: &str) -> Session {
    let (email, password) = match who {
        "T1" => ("t1@college.edu", "pass1"),
        "T2" => ("t2@college.edu", "pass2"),
        "D1" => ("head@college.edu", "headpass"),
        "A1" => ("admin@college.edu", "adminpass"),
        other => panic!("no fixture account {other}"),
    };
    manager.login(email, password).expect("login")
}
