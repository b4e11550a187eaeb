use anyhow::{Context, Result, bail};
use attendance::cli::{Cli, Command};
use attendance::models::{EventKey, ExemptionInterval};
use attendance::recorder::Submission;
use attendance::session::Session;
use attendance::{AttendanceManager, CsvStore, Settings, display, export};
use clap::Parser;
use std::fs::File;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)
        .with_context(|| format!("failed to read {}", cli.config.display()))?;
    let manager = attendance::create_manager(&settings)?;

    let (Some(email), Some(password)) = (cli.email.as_deref(), cli.password.as_deref()) else {
        bail!("--email and --password (or ATTENDANCE_EMAIL and ATTENDANCE_PASSWORD) are required");
    };
    let session = manager.login(email, password)?;

    run(&manager, &session, &settings, cli.command)
}

fn run(
    manager: &AttendanceManager<CsvStore>,
    session: &Session,
    settings: &Settings,
    command: Command,
) -> Result<()> {
    match command {
        Command::Courses => display::show_courses(&manager.assigned_courses(session)?),

        Command::ClassList { course } => {
            display::show_class_list(&course, &manager.class_list(&course)?)
        }

        Command::TakenHours { course, date } => {
            let taken = manager.taken_hours(&course, date)?;
            let available = manager.available_hours(&course, date)?;
            display::show_hours(&course, date, &taken, &available);
        }

        Command::Submit {
            course,
            date,
            hour,
            marks,
            extra_time,
            duration,
        } => {
            let submission = marks
                .into_iter()
                .fold(Submission::new(course, date, hour), |submission, (student, status)| {
                    submission.mark(student, status)
                })
                .extra(extra_time, duration);

            let appended = manager.submit(session, &submission)?;
            println!("Attendance submitted for {appended} students.");
        }

        Command::Events { date } => display::show_events(date, &manager.events_on(session, date)?),

        Command::EditStatus { key, status } => {
            let key = EventKey::from(key);
            manager.edit_status(session, &key, status)?;
            println!("Updated {key} to {status}.");
        }

        Command::DeleteEvent { key } => {
            let key = EventKey::from(key);
            manager.delete_event(session, &key)?;
            println!("Entry deleted.");
        }

        Command::AddExemption {
            student,
            start,
            end,
            activity,
        } => {
            if start > end {
                eprintln!("Warning: {start} is after {end}, so no days will be exempted.");
            }
            manager.add_exemption(
                session,
                ExemptionInterval {
                    student_id: student,
                    start_date: start,
                    end_date: end,
                    activity,
                },
            )?;
            println!("Camp days added.");
        }

        Command::ListExemptions => display::show_exemptions(&manager.exemptions(session)?),

        Command::DeleteExemption { index } => {
            let removed = manager.delete_exemption(session, index)?;
            println!(
                "Deleted camp days for {} ({} to {}).",
                removed.student_id, removed.start_date, removed.end_date
            );
        }

        Command::ImportSelection { file } => {
            let source = File::open(&file)
                .with_context(|| format!("failed to open {}", file.display()))?;
            let summary = manager.import_course_selection(session, source)?;
            println!(
                "Enrollment generated: {} rows for {} students ({} rows skipped).",
                summary.enrollments, summary.students, summary.skipped
            );
        }

        Command::Report {
            range,
            export: export_path,
        } => {
            let rows = manager.report(session, range.range(), range.scope.into())?;
            display::show_report(range.range(), &rows);
            if let Some(path) = export_path {
                write_export(&path, |file| export::write_report(file, &rows))?;
            }
        }

        Command::DetailedLog {
            range,
            export: export_path,
        } => {
            let rows = manager.detailed_log(session, range.range(), range.scope.into())?;
            display::show_log(&rows);
            if let Some(path) = export_path {
                write_export(&path, |file| export::write_log(file, &rows))?;
            }
        }

        Command::Summary {
            export: export_path,
        } => {
            let rows = manager.status_summary(session)?;
            display::show_summary(&rows);
            if let Some(path) = export_path {
                write_export(&path, |file| export::write_summary(file, &rows))?;
            }
        }

        Command::FlagAtRisk { range, threshold } => {
            let threshold = threshold.unwrap_or(settings.attendance_manager.warning_percent);
            let rows = manager.at_risk(session, range.range(), range.scope.into(), threshold)?;
            display::show_at_risk(range.range(), threshold, &rows);
        }
    }

    Ok(())
}

fn write_export(
    path: &Path,
    write: impl FnOnce(File) -> attendance::error::Result<()>,
) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write(file).with_context(|| format!("failed to export to {}", path.display()))?;
    println!("Exported to {}.", path.display());
    Ok(())
}
