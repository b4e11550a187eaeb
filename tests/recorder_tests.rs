mod common;

use attendance::Error;
use attendance::models::{DateRange, Status};
use attendance::recorder::Submission;
use attendance::{RecordStore, ReportScope};
use common::{data_dir, date, login, manager};
use std::collections::BTreeSet;

#[test]
fn submission_appends_one_row_per_enrolled_student() {
    let dir = data_dir();
    let manager = manager(&dir);
    let teacher = login(&manager, "T1");

    let submission = Submission::new("C1", date(2024, 1, 10), 1).mark("S2", Status::Absent);
    let appended = manager.submit(&teacher, &submission).unwrap();
    assert_eq!(appended, 2);

    let mut events = manager.store().attendance().unwrap();
    events.sort_by(|a, b| a.student_id.cmp(&b.student_id));
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].student_id, "S1");
    assert_eq!(events[0].status, Status::Present);
    assert_eq!(events[0].marked_by, "T1");
    assert_eq!(events[1].status, Status::Absent);
    assert!(events.iter().all(|e| e.extra_time.is_empty()));
}

#[test]
fn taken_hour_is_rejected() {
    let dir = data_dir();
    let manager = manager(&dir);
    let teacher = login(&manager, "T1");
    let day = date(2024, 1, 10);

    manager
        .submit(&teacher, &Submission::new("C1", day, 2))
        .unwrap();
    assert_eq!(manager.taken_hours("C1", day).unwrap(), BTreeSet::from([2]));
    assert_eq!(manager.available_hours("C1", day).unwrap(), vec![1, 3, 4, 5, 6]);

    let err = manager
        .submit(&teacher, &Submission::new("C1", day, 2).mark("S1", Status::Absent))
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateSlot { hour: 2, .. }));

    // Nothing was overwritten or appended.
    let events = manager.store().attendance().unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.status == Status::Present));
}

#[test]
fn same_hour_on_another_day_or_course_is_free() {
    let dir = data_dir();
    let manager = manager(&dir);
    let t1 = login(&manager, "T1");
    let t2 = login(&manager, "T2");

    manager
        .submit(&t1, &Submission::new("C1", date(2024, 1, 10), 3))
        .unwrap();
    manager
        .submit(&t1, &Submission::new("C1", date(2024, 1, 11), 3))
        .unwrap();
    manager
        .submit(&t2, &Submission::new("C2", date(2024, 1, 10), 3))
        .unwrap();

    assert_eq!(manager.store().attendance().unwrap().len(), 6);
}

#[test]
fn extra_hours_never_collide() {
    let dir = data_dir();
    let manager = manager(&dir);
    let teacher = login(&manager, "T1");
    let day = date(2024, 1, 10);

    for start in ["9:00 AM", "4:00 PM", "5:30 PM"] {
        let submission = Submission::new("C1", day, 0).extra(start, "1 hour");
        assert_eq!(manager.submit(&teacher, &submission).unwrap(), 2);
    }

    assert!(manager.taken_hours("C1", day).unwrap().is_empty());
    let events = manager.store().attendance().unwrap();
    assert_eq!(events.len(), 6);
    assert!(events.iter().any(|e| e.extra_time == "4:00 PM" && e.duration == "1 hour"));
}

#[test]
fn extra_time_is_dropped_for_timetabled_hours() {
    let dir = data_dir();
    let manager = manager(&dir);
    let teacher = login(&manager, "T1");

    let submission = Submission::new("C1", date(2024, 1, 10), 4).extra("4:00 PM", "1 hour");
    manager.submit(&teacher, &submission).unwrap();

    let events = manager.store().attendance().unwrap();
    assert!(
        events
            .iter()
            .all(|e| e.extra_time.is_empty() && e.duration.is_empty())
    );
}

#[test]
fn marks_for_students_outside_the_course_are_ignored() {
    let dir = data_dir();
    let manager = manager(&dir);
    let teacher = login(&manager, "T1");

    let submission = Submission::new("C1", date(2024, 1, 10), 1).mark("S3", Status::Absent);
    assert_eq!(manager.submit(&teacher, &submission).unwrap(), 2);

    let events = manager.store().attendance().unwrap();
    assert!(events.iter().all(|e| e.student_id != "S3"));
}

#[test]
fn teachers_can_only_submit_for_their_courses() {
    let dir = data_dir();
    let manager = manager(&dir);
    let teacher = login(&manager, "T1");

    let err = manager
        .submit(&teacher, &Submission::new("C2", date(2024, 1, 10), 1))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownCourse(course) if course == "C2"));
    assert!(manager.store().attendance().unwrap().is_empty());
}

#[test]
fn invalid_hour_is_a_validation_error() {
    let dir = data_dir();
    let manager = manager(&dir);
    let teacher = login(&manager, "T1");

    let err = manager
        .submit(&teacher, &Submission::new("C1", date(2024, 1, 10), 7))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn course_without_enrollment_is_rejected() {
    let dir = data_dir();
    common::write(dir.path(), "courses.csv", "course_id,teacher_id\nC1,T1\nC9,T1\n");
    let manager = manager(&dir);
    let teacher = login(&manager, "T1");

    let err = manager
        .submit(&teacher, &Submission::new("C9", date(2024, 1, 10), 1))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn enrollment_is_read_at_submission_time() {
    let dir = data_dir();
    let manager = manager(&dir);
    let teacher = login(&manager, "T1");

    common::write(
        dir.path(),
        "enrollment.csv",
        "student_id,course_id\nS1,C1\nS2,C1\nS3,C1\n",
    );

    let appended = manager
        .submit(&teacher, &Submission::new("C1", date(2024, 1, 10), 1))
        .unwrap();
    assert_eq!(appended, 3);
}

#[test]
fn submitted_rows_aggregate_back_exactly() {
    let dir = data_dir();
    let manager = manager(&dir);
    let teacher = login(&manager, "T1");
    let admin = login(&manager, "A1");

    let sessions = [
        (10, 1, Some(Status::Absent)),
        (10, 2, Some(Status::NccDuty)),
        (11, 1, None),
        (12, 0, Some(Status::ClubDuty)),
        (12, 5, Some(Status::Absent)),
    ];
    for (day, hour, s2) in sessions {
        let mut submission = Submission::new("C1", date(2024, 1, day), hour);
        if let Some(status) = s2 {
            submission = submission.mark("S2", status);
        }
        manager.submit(&teacher, &submission).unwrap();
    }

    let events = manager.store().attendance().unwrap();
    let expected_total = events.iter().filter(|e| e.student_id == "S2").count();
    let expected_attended = events
        .iter()
        .filter(|e| e.student_id == "S2" && e.status != Status::Absent)
        .count();

    let rows = manager
        .report(
            &admin,
            DateRange::new(date(2024, 1, 1), date(2024, 1, 31)),
            ReportScope::Department,
        )
        .unwrap();
    let s2 = rows.iter().find(|r| r.student_id == "S2").unwrap();
    assert_eq!(s2.total, expected_total);
    assert_eq!(s2.attended, expected_attended);
    assert_eq!((s2.total, s2.attended, s2.percent), (5, 3, 60.0));
}
