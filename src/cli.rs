//! This module contains the command-line interface [`Cli`] parser for recording and reporting
//! attendance.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::manager::ReportScope;
use crate::models::{DateRange, EventKey, Status};
use crate::schema::{EXTRA_HOUR, REGULAR_HOURS};

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(author, version, about = "FYUGP attendance bookkeeping")]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    /// Email of the staff account to act as.
    #[arg(long, env = "ATTENDANCE_EMAIL", global = true)]
    pub email: Option<String>,

    /// Password of the staff account to act as.
    #[arg(long, env = "ATTENDANCE_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// The different commands available for managing attendance records.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the courses assigned to you.
    Courses,

    /// List the students enrolled in a course.
    ClassList { course: String },

    /// Show which hours of a course already have attendance on a date.
    TakenHours { course: String, date: NaiveDate },

    /// Record attendance for one hour of a course. Unmarked students are present.
    Submit {
        course: String,
        date: NaiveDate,

        /// Hour 1 to 6, or `extra` for a session outside the timetable.
        #[arg(value_parser = parse_hour)]
        hour: u8,

        /// A status other than present, as `STUDENT=STATUS` (P, A, NSS, NCC, Club).
        #[arg(short, long = "mark", value_parser = parse_mark)]
        marks: Vec<(String, Status)>,

        /// Start time of an extra session, e.g. `4:00 PM`.
        #[arg(long, default_value = "")]
        extra_time: String,

        /// Duration of an extra session, e.g. `1 hour`.
        #[arg(long, default_value = "")]
        duration: String,
    },

    /// List the attendance recorded on a date.
    Events { date: NaiveDate },

    /// Correct the status of a recorded attendance entry.
    EditStatus {
        #[command(flatten)]
        key: EventKeyArgs,
        status: Status,
    },

    /// Delete a recorded attendance entry.
    DeleteEvent {
        #[command(flatten)]
        key: EventKeyArgs,
    },

    /// Exempt a student from attendance between two dates, inclusive.
    AddExemption {
        student: String,
        start: NaiveDate,
        end: NaiveDate,
        #[arg(default_value = "Camp")]
        activity: String,
    },

    /// List camp and activity exemptions with their index.
    ListExemptions,

    /// Delete the exemption at the given index.
    DeleteExemption { index: usize },

    /// Replace the enrollment table from a one-row-per-student course selection file.
    ImportSelection { file: PathBuf },

    /// Show the consolidated attendance report for a date range.
    Report {
        #[command(flatten)]
        range: RangeArgs,

        /// Also write the report as CSV to this path.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Show every counted attendance entry for a date range.
    DetailedLog {
        #[command(flatten)]
        range: RangeArgs,

        /// Also write the log as CSV to this path.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Show how often each status was recorded per student.
    Summary {
        /// Also write the summary as CSV to this path.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Flag students whose attendance is below the warning threshold.
    FlagAtRisk {
        #[command(flatten)]
        range: RangeArgs,

        /// Percentage threshold, defaulting to the configured `warning_percent`.
        #[arg(long)]
        threshold: Option<f64>,
    },
}

#[derive(Args, Debug)]
pub struct EventKeyArgs {
    pub date: NaiveDate,
    pub course: String,
    pub student: String,
    #[arg(value_parser = parse_hour)]
    pub hour: u8,

    /// Start time of the extra session to select, as listed by `events`.
    #[arg(long, default_value = "")]
    pub extra_time: String,

    /// Duration of the extra session to select.
    #[arg(long, default_value = "")]
    pub duration: String,
}

impl From<EventKeyArgs> for EventKey {
    fn from(args: EventKeyArgs) -> Self {
        EventKey {
            date: args.date,
            course_id: args.course,
            student_id: args.student,
            hour: args.hour,
            extra_time: args.extra_time,
            duration: args.duration,
        }
    }
}

#[derive(Args, Debug)]
pub struct RangeArgs {
    pub from: NaiveDate,
    pub to: NaiveDate,

    #[arg(long, value_enum, default_value_t = Scope::Department)]
    pub scope: Scope,
}

impl RangeArgs {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.from, self.to)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Your department's students across all their courses.
    Department,
    /// Students of the courses you teach, counting only those courses.
    Taught,
}

impl From<Scope> for ReportScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Department => ReportScope::Department,
            Scope::Taught => ReportScope::TaughtCourses,
        }
    }
}

fn parse_hour(input: &str) -> Result<u8, String> {
    if input.eq_ignore_ascii_case("extra") {
        return Ok(EXTRA_HOUR);
    }
    match input.parse::<u8>() {
        Ok(hour) if hour == EXTRA_HOUR || REGULAR_HOURS.contains(&hour) => Ok(hour),
        _ => Err(format!("'{input}' is not an hour (1-6 or extra)")),
    }
}

fn parse_mark(input: &str) -> Result<(String, Status), String> {
    let (student, status) = input
        .split_once('=')
        .ok_or_else(|| format!("'{input}' is not STUDENT=STATUS"))?;
    Ok((student.trim().to_string(), status.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_submit_with_marks() {
        let cli = Cli::try_parse_from([
            "attendance",
            "submit",
            "C1",
            "2024-01-10",
            "extra",
            "--mark",
            "S2=A",
            "-m",
            "S3=nss",
            "--extra-time",
            "4:00 PM",
        ])
        .unwrap();

        let Command::Submit {
            hour,
            marks,
            extra_time,
            ..
        } = cli.command
        else {
            panic!("expected submit");
        };
        assert_eq!(hour, EXTRA_HOUR);
        assert_eq!(
            marks,
            vec![
                ("S2".to_string(), Status::Absent),
                ("S3".to_string(), Status::NssDuty)
            ]
        );
        assert_eq!(extra_time, "4:00 PM");
    }

    #[test]
    fn extra_session_keys_carry_the_start_time() {
        let cli = Cli::try_parse_from([
            "attendance",
            "delete-event",
            "2024-01-10",
            "C1",
            "S1",
            "extra",
            "--extra-time",
            "9:00 AM",
            "--duration",
            "1 hour",
        ])
        .unwrap();

        let Command::DeleteEvent { key } = cli.command else {
            panic!("expected delete-event");
        };
        let key = EventKey::from(key);
        assert_eq!(key.hour, EXTRA_HOUR);
        assert_eq!(key.extra_time, "9:00 AM");
        assert_eq!(key.duration, "1 hour");
    }

    #[test]
    fn rejects_out_of_range_hours() {
        assert!(parse_hour("7").is_err());
        assert_eq!(parse_hour("6"), Ok(6));
        assert!(parse_mark("S1").is_err());
    }
}
