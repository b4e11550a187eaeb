//! CSV export of reports, detailed logs and summaries.

use serde::Serialize;
use std::io::Write;

use crate::error::Result;
use crate::models::{LogRow, ReportRow, StatusSummaryRow};

fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the consolidated report with a `student_id,name,total,attended,percent` header.
pub fn write_report<W: Write>(writer: W, rows: &[ReportRow]) -> Result<()> {
    if rows.is_empty() {
        return write_header(writer, &["student_id", "name", "total", "attended", "percent"]);
    }
    write_rows(writer, rows)
}

/// Writes the detailed log: the attendance columns followed by `name,major_course`.
pub fn write_log<W: Write>(writer: W, rows: &[LogRow]) -> Result<()> {
    if rows.is_empty() {
        return write_header(
            writer,
            &[
                "date",
                "hour",
                "course_id",
                "student_id",
                "status",
                "marked_by",
                "extra_time",
                "duration",
                "name",
                "major_course",
            ],
        );
    }
    write_rows(writer, rows)
}

pub fn write_summary<W: Write>(writer: W, rows: &[StatusSummaryRow]) -> Result<()> {
    if rows.is_empty() {
        return write_header(writer, &["student_id", "P", "A", "NSS", "NCC", "Club"]);
    }
    write_rows(writer, rows)
}

// Serialized headers only appear with the first row, so empty exports write theirs directly.
fn write_header<W: Write>(writer: W, columns: &[&str]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(columns)?;
    writer.flush()?;
    Ok(())
}
