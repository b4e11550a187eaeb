use chrono::NaiveDate;
use std::collections::BTreeSet;
use tabled::{Table, Tabled, settings::Style};

use crate::models::{
    AttendanceEvent, Course, DateRange, ExemptionInterval, LogRow, ReportRow, StatusSummaryRow,
    Student,
};
use crate::schema::EXTRA_HOUR;

fn print_table<T: Tabled>(title: &str, rows: impl IntoIterator<Item = T>) {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{title}:\n{table}");
}

pub fn show_courses(courses: &[Course]) {
    if courses.is_empty() {
        println!("You have no assigned courses.");
        return;
    }

    #[derive(Tabled)]
    struct CourseLine<'a> {
        course_id: &'a str,
    }

    print_table(
        "Assigned courses",
        courses.iter().map(|course| CourseLine {
            course_id: &course.course_id,
        }),
    );
}

pub fn show_class_list(course_id: &str, students: &[Student]) {
    if students.is_empty() {
        println!("No students enrolled in {course_id}.");
        return;
    }

    #[derive(Tabled)]
    struct StudentLine<'a> {
        student_id: &'a str,
        name: &'a str,
        major_course: &'a str,
    }

    print_table(
        &format!("Class list for {course_id}"),
        students.iter().map(|student| StudentLine {
            student_id: &student.student_id,
            name: &student.name,
            major_course: &student.program,
        }),
    );
}

/// Prints the hours already taken and the ones still open, plus the always-available extra hour.
pub fn show_hours(course_id: &str, date: NaiveDate, taken: &BTreeSet<u8>, available: &[u8]) {
    let taken: Vec<String> = taken.iter().map(|hour| hour.to_string()).collect();
    let mut open: Vec<String> = available.iter().map(|hour| hour.to_string()).collect();
    open.push("extra".to_string());

    println!("{course_id} on {date}:");
    if taken.is_empty() {
        println!("  taken:     none");
    } else {
        println!("  taken:     {}", taken.join(", "));
    }
    println!("  available: {}", open.join(", "));
}

#[derive(Tabled)]
struct EventLine<'a> {
    date: String,
    hour: String,
    course_id: &'a str,
    student_id: &'a str,
    status: &'static str,
    marked_by: &'a str,
}

fn hour_label(hour: u8, extra_time: &str, duration: &str) -> String {
    if hour != EXTRA_HOUR {
        return hour.to_string();
    }
    match (extra_time.is_empty(), duration.is_empty()) {
        (true, true) => "extra".to_string(),
        _ => format!("extra {extra_time} {duration}").trim_end().to_string(),
    }
}

pub fn show_events(date: NaiveDate, events: &[AttendanceEvent]) {
    if events.is_empty() {
        println!("No attendance recorded on {date}.");
        return;
    }

    print_table(
        &format!("Attendance on {date}"),
        events.iter().map(|event| EventLine {
            date: event.date.to_string(),
            hour: hour_label(event.hour, &event.extra_time, &event.duration),
            course_id: &event.course_id,
            student_id: &event.student_id,
            status: event.status.code(),
            marked_by: &event.marked_by,
        }),
    );
}

pub fn show_exemptions(intervals: &[ExemptionInterval]) {
    if intervals.is_empty() {
        println!("No camp day entries.");
        return;
    }

    #[derive(Tabled)]
    struct ExemptionLine<'a> {
        index: usize,
        student_id: &'a str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        activity: &'a str,
    }

    print_table(
        "Camp days",
        intervals
            .iter()
            .enumerate()
            .map(|(index, interval)| ExemptionLine {
                index,
                student_id: &interval.student_id,
                start_date: interval.start_date,
                end_date: interval.end_date,
                activity: &interval.activity,
            }),
    );
}

#[derive(Tabled)]
struct ReportLine<'a> {
    student_id: &'a str,
    name: &'a str,
    total: usize,
    attended: usize,
    percent: String,
}

fn report_lines<'a>(rows: impl IntoIterator<Item = &'a ReportRow>) -> Vec<ReportLine<'a>> {
    rows.into_iter()
        .map(|row| ReportLine {
            student_id: &row.student_id,
            name: &row.name,
            total: row.total,
            attended: row.attended,
            percent: format!("{:.1}", row.percent),
        })
        .collect()
}

pub fn show_report(range: DateRange, rows: &[ReportRow]) {
    if rows.is_empty() {
        println!("No students to report between {} and {}.", range.from, range.to);
        return;
    }

    print_table(
        &format!("Attendance report {} to {}", range.from, range.to),
        report_lines(rows),
    );
}

pub fn show_at_risk(range: DateRange, threshold: f64, rows: &[ReportRow]) {
    if rows.is_empty() {
        println!("No students below {threshold:.1}% between {} and {}.", range.from, range.to);
        return;
    }

    print_table(
        &format!("Students below {threshold:.1}% ({} to {})", range.from, range.to),
        report_lines(rows),
    );
}

pub fn show_log(rows: &[LogRow]) {
    if rows.is_empty() {
        println!("No attendance records in this range.");
        return;
    }

    #[derive(Tabled)]
    struct LogLine<'a> {
        date: NaiveDate,
        hour: String,
        course_id: &'a str,
        student_id: &'a str,
        name: &'a str,
        status: &'static str,
    }

    print_table(
        "Detailed log",
        rows.iter().map(|row| LogLine {
            date: row.date,
            hour: hour_label(row.hour, &row.extra_time, &row.duration),
            course_id: &row.course_id,
            student_id: &row.student_id,
            name: &row.name,
            status: row.status.code(),
        }),
    );
}

pub fn show_summary(rows: &[StatusSummaryRow]) {
    if rows.is_empty() {
        println!("No attendance records to display.");
        return;
    }

    #[derive(Tabled)]
    struct SummaryLine<'a> {
        student_id: &'a str,
        #[tabled(rename = "P")]
        present: usize,
        #[tabled(rename = "A")]
        absent: usize,
        #[tabled(rename = "NSS")]
        nss: usize,
        #[tabled(rename = "NCC")]
        ncc: usize,
        #[tabled(rename = "Club")]
        club: usize,
    }

    print_table(
        "Attendance summary",
        rows.iter().map(|row| SummaryLine {
            student_id: &row.student_id,
            present: row.present,
            absent: row.absent,
            nss: row.nss,
            ncc: row.ncc,
            club: row.club,
        }),
    );
}
