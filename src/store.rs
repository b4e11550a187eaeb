//! The record store: whole-table load and replace over a directory of CSV files.
//!
//! Every write replaces a whole table. Readers never observe a half-written table because rows are
//! staged in a sibling file and renamed over the original. There is no locking: two writers racing
//! on the same table resolve as last writer wins.
//!
//! Rows that fail validation are skipped on read but carried through every rewrite of their table,
//! so an update never destroys data it could not parse.

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{AttendanceEvent, Course, Enrollment, ExemptionInterval, Student, Teacher};
use crate::schema::{
    self, ATTENDANCE, AttendanceRecord, COURSES, ENROLLMENT, EXEMPTIONS, ExemptionRecord,
    STUDENTS, TEACHERS, Table,
};

/// Load-all access to every table the engine works with, and whole-table updates of the tables
/// it changes.
pub trait RecordStore {
    fn students(&self) -> Result<Vec<Student>>;
    fn teachers(&self) -> Result<Vec<Teacher>>;
    fn courses(&self) -> Result<Vec<Course>>;
    fn enrollment(&self) -> Result<Vec<Enrollment>>;
    fn attendance(&self) -> Result<Vec<AttendanceEvent>>;
    fn exemptions(&self) -> Result<Vec<ExemptionInterval>>;

    /// Replaces the enrollment table outright.
    fn replace_enrollment(&self, rows: &[Enrollment]) -> Result<()>;

    /// Loads the attendance table, lets `edit` change the readable rows, then writes the table
    /// back. Nothing is written when `edit` fails.
    fn update_attendance<T, F>(&self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<AttendanceEvent>) -> Result<T>;

    /// Like [`RecordStore::update_attendance`], for the camp days table.
    fn update_exemptions<T, F>(&self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<ExemptionInterval>) -> Result<T>;
}

/// A table as found on disk, before any row is interpreted.
struct RawTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl RawTable {
    /// Splits the records into validated rows and the unreadable rest. The unreadable records are
    /// returned in canonical column order so they can be written back under the canonical header.
    fn validate<R, T, F>(&self, table: &Table, validate: F) -> (Vec<T>, Vec<StringRecord>)
    where
        R: DeserializeOwned,
        F: Fn(R) -> Result<T>,
    {
        let mut rows = Vec::new();
        let mut unreadable = Vec::new();
        for record in &self.records {
            let row = record
                .deserialize::<R>(Some(&self.headers))
                .map_err(Error::from)
                .and_then(&validate);
            match row {
                Ok(row) => rows.push(row),
                Err(e) => {
                    let line = record.position().map(|p| p.line());
                    warn!(table = table.name, line, error = %e, "skipping row");
                    unreadable.push(self.canonical(table, record));
                }
            }
        }
        (rows, unreadable)
    }

    fn canonical(&self, table: &Table, record: &StringRecord) -> StringRecord {
        table
            .columns
            .iter()
            .map(|column| {
                self.headers
                    .iter()
                    .position(|header| header == *column)
                    .and_then(|i| record.get(i))
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// A [`RecordStore`] backed by one CSV file per table in a single directory.
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, table: &Table) -> PathBuf {
        self.dir.join(table.file)
    }

    /// Creates every optional table that does not exist yet, with only its header row.
    ///
    /// Returns the names of the tables that were created.
    pub fn initialize(&self) -> Result<Vec<&'static str>> {
        let mut created = Vec::new();
        for table in [ENROLLMENT, ATTENDANCE, EXEMPTIONS] {
            if !self.path(&table).exists() {
                self.write::<Enrollment>(&table, &[], &[])?;
                created.push(table.name);
            }
        }
        Ok(created)
    }

    /// Reads a table's header and records with its key columns checked.
    ///
    /// Returns `None` for an optional table whose file does not exist.
    fn load(&self, table: &Table) -> Result<Option<RawTable>> {
        let path = self.path(table);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if table.primary {
                    return Err(Error::MissingFile {
                        table: table.name,
                        path,
                    });
                }
                warn!(table = table.name, "table not found, using an empty one");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = reader_builder().from_reader(file);
        let mut headers = reader.headers()?.clone();
        if headers.is_empty() && !table.primary {
            return Ok(Some(RawTable {
                headers: table.header_record(),
                records: Vec::new(),
            }));
        }

        let mut records = Vec::new();
        if table.name == ATTENDANCE.name
            && let Some(reconciled) = schema::reconcile_attendance_headers(&headers)
        {
            // Without a header, the first line is data.
            records.push(headers);
            headers = reconciled;
        }
        table.check_headers(&headers)?;

        for record in reader.records() {
            records.push(record?);
        }
        Ok(Some(RawTable { headers, records }))
    }

    /// Reads and validates every row, skipping the ones that do not validate.
    ///
    /// An optional table without its key columns reads as empty.
    fn read_validated<R, T, F>(&self, table: &Table, validate: F) -> Result<Vec<T>>
    where
        R: DeserializeOwned,
        F: Fn(R) -> Result<T>,
    {
        match self.load(table) {
            Ok(Some(raw)) => Ok(raw.validate(table, validate).0),
            Ok(None) => Ok(Vec::new()),
            Err(e @ Error::Schema { .. }) if !table.primary => {
                warn!(table = table.name, error = %e, "unreadable table, using an empty one");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn read<T: DeserializeOwned>(&self, table: &Table) -> Result<Vec<T>> {
        self.read_validated(table, Ok::<T, Error>)
    }

    /// Loads, edits and rewrites a table, keeping its unreadable rows.
    ///
    /// Unlike reads, a table whose header was rejected is an error here: rewriting it would
    /// discard every row in it.
    fn update<R, T, F, O, E>(&self, table: &Table, validate: F, edit: E) -> Result<O>
    where
        R: DeserializeOwned,
        T: Serialize,
        F: Fn(R) -> Result<T>,
        E: FnOnce(&mut Vec<T>) -> Result<O>,
    {
        let (mut rows, unreadable) = match self.load(table)? {
            Some(raw) => raw.validate(table, validate),
            None => (Vec::new(), Vec::new()),
        };

        let outcome = edit(&mut rows)?;
        if !unreadable.is_empty() {
            warn!(
                table = table.name,
                kept = unreadable.len(),
                "keeping unreadable rows in the rewritten table"
            );
        }
        self.write(table, &rows, &unreadable)?;
        Ok(outcome)
    }

    fn write<T: Serialize>(
        &self,
        table: &Table,
        rows: &[T],
        unreadable: &[StringRecord],
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(table);
        let staging = path.with_extension("csv.tmp");

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(&staging)?;
        writer.write_record(table.columns)?;
        for row in rows {
            writer.serialize(row)?;
        }
        for record in unreadable {
            writer.write_record(record)?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&staging, &path)?;
        info!(
            table = table.name,
            rows = rows.len() + unreadable.len(),
            "table written"
        );
        Ok(())
    }
}

pub(crate) fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.trim(Trim::All).flexible(true);
    builder
}

/// Reads rows of any table-shaped upload, skipping rows that fail to deserialize.
///
/// Returns the rows and the number skipped.
pub(crate) fn read_upload<T, R>(table: &Table, source: R) -> Result<(Vec<T>, usize)>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut reader = reader_builder().from_reader(source);
    table.check_headers(reader.headers()?)?;

    let mut rows = Vec::new();
    let mut skipped = 0;
    for (line, row) in reader.deserialize::<T>().enumerate() {
        match row {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(table = table.name, line = line + 2, error = %e, "skipping row");
                skipped += 1;
            }
        }
    }
    Ok((rows, skipped))
}

impl RecordStore for CsvStore {
    fn students(&self) -> Result<Vec<Student>> {
        self.read(&STUDENTS)
    }

    fn teachers(&self) -> Result<Vec<Teacher>> {
        self.read(&TEACHERS)
    }

    fn courses(&self) -> Result<Vec<Course>> {
        self.read(&COURSES)
    }

    fn enrollment(&self) -> Result<Vec<Enrollment>> {
        self.read(&ENROLLMENT)
    }

    fn attendance(&self) -> Result<Vec<AttendanceEvent>> {
        self.read_validated(&ATTENDANCE, AttendanceRecord::into_event)
    }

    fn exemptions(&self) -> Result<Vec<ExemptionInterval>> {
        self.read_validated(&EXEMPTIONS, ExemptionRecord::into_interval)
    }

    fn replace_enrollment(&self, rows: &[Enrollment]) -> Result<()> {
        self.write(&ENROLLMENT, rows, &[])
    }

    fn update_attendance<T, F>(&self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<AttendanceEvent>) -> Result<T>,
    {
        self.update(&ATTENDANCE, AttendanceRecord::into_event, edit)
    }

    fn update_exemptions<T, F>(&self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<ExemptionInterval>) -> Result<T>,
    {
        self.update(&EXEMPTIONS, ExemptionRecord::into_interval, edit)
    }
}
