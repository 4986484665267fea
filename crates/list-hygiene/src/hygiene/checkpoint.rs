//! Append-only CSV ledger of every address the sweep has verified.
//!
//! The log is the only resumability signal: an address is "done" once its row
//! has been flushed to disk, whatever happens to the run afterwards.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use super::domain::{is_truthy, normalize_email, CheckpointRecord};

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint log io failure: {0}")]
    Io(#[from] io::Error),
    #[error("checkpoint log csv failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("checkpoint log is missing the '{0}' column")]
    MissingColumn(&'static str),
}

#[derive(Debug, Clone)]
pub struct CheckpointLog {
    path: PathBuf,
}

impl CheckpointLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Normalized emails already checked. A missing log means a first run.
    pub fn load(&self) -> Result<HashSet<String>, CheckpointError> {
        Ok(self.scan()?.checked)
    }

    /// Checked emails plus those with at least one bad outcome on record.
    /// Reads only the `email` and `is_bad` columns.
    pub fn scan(&self) -> Result<CheckpointScan, CheckpointError> {
        let Some(mut reader) = self.open_reader()? else {
            return Ok(CheckpointScan::default());
        };
        let headers = reader.headers()?.clone();
        let email_idx = column_index(&headers, "email")?;
        let is_bad_idx = column_index(&headers, "is_bad").ok();
        let checked_at_idx = column_index(&headers, "checked_at").ok();

        let mut scan = CheckpointScan::default();
        for row in reader.records() {
            let row = row?;
            if is_torn(&row, &headers, checked_at_idx) {
                continue;
            }
            let email = normalize_email(row.get(email_idx).unwrap_or_default());
            if email.is_empty() {
                continue;
            }

            let is_bad = is_bad_idx
                .and_then(|idx| row.get(idx))
                .is_some_and(is_truthy);
            if is_bad {
                scan.bad.insert(email.clone());
            }
            scan.checked.insert(email);
        }

        Ok(scan)
    }

    /// Durably append one record. Returns only after the row is on disk.
    pub fn append(&self, record: &CheckpointRecord) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;

        let len = file.metadata()?.len();
        if len > 0 && !ends_with_newline(&mut file, len)? {
            // torn row from an interrupted write
            file.write_all(b"\n")?;
        }

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(len == 0)
                .from_writer(&mut file);
            writer.serialize(record)?;
            writer.flush()?;
        }

        file.sync_data()?;
        Ok(())
    }

    /// Every row in file order, including duplicates.
    pub fn records(&self) -> Result<Vec<CheckpointRecord>, CheckpointError> {
        let Some(mut reader) = self.open_reader()? else {
            return Ok(Vec::new());
        };
        let headers = reader.headers()?.clone();
        let email_idx = column_index(&headers, "email")?;
        let result_idx = column_index(&headers, "result")?;
        let is_bad_idx = column_index(&headers, "is_bad")?;
        let checked_at_idx = column_index(&headers, "checked_at")?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            if is_torn(&row, &headers, Some(checked_at_idx)) {
                continue;
            }
            let email = normalize_email(row.get(email_idx).unwrap_or_default());
            if email.is_empty() {
                continue;
            }
            let Some(checked_at) = row.get(checked_at_idx).and_then(parse_timestamp) else {
                continue;
            };

            records.push(CheckpointRecord {
                email,
                result: row.get(result_idx).unwrap_or_default().trim().to_string(),
                is_bad: row.get(is_bad_idx).map(is_truthy).unwrap_or(false),
                checked_at,
            });
        }

        Ok(records)
    }

    pub fn bad_emails(&self) -> Result<BTreeSet<String>, CheckpointError> {
        Ok(self.scan()?.bad)
    }

    fn open_reader(&self) -> Result<Option<csv::Reader<File>>, CheckpointError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(
            csv::ReaderBuilder::new()
                .flexible(true)
                .trim(csv::Trim::All)
                .from_reader(file),
        ))
    }
}

/// Result of one pass over the log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointScan {
    pub checked: HashSet<String>,
    pub bad: BTreeSet<String>,
}

/// Summary of a checkpoint log for operators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointStats {
    pub rows: usize,
    pub distinct_emails: usize,
    pub bad_emails: usize,
    pub by_result: BTreeMap<String, usize>,
    pub first_checked: Option<DateTime<Utc>>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl CheckpointStats {
    pub fn from_records(records: &[CheckpointRecord]) -> Self {
        let mut emails = HashSet::new();
        let mut bad = HashSet::new();
        let mut by_result = BTreeMap::new();

        for record in records {
            emails.insert(record.email.as_str());
            if record.is_bad {
                bad.insert(record.email.as_str());
            }
            *by_result.entry(record.result.clone()).or_insert(0) += 1;
        }

        Self {
            rows: records.len(),
            distinct_emails: emails.len(),
            bad_emails: bad.len(),
            by_result,
            first_checked: records.iter().map(|record| record.checked_at).min(),
            last_checked: records.iter().map(|record| record.checked_at).max(),
        }
    }
}

fn column_index(headers: &csv::StringRecord, name: &'static str) -> Result<usize, CheckpointError> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
        .ok_or(CheckpointError::MissingColumn(name))
}

/// A row cut short by an interrupted append: missing fields, or a `checked_at`
/// that stops mid-value. Such rows are skipped by every reader.
fn is_torn(
    row: &csv::StringRecord,
    headers: &csv::StringRecord,
    checked_at_idx: Option<usize>,
) -> bool {
    let torn = row.len() < headers.len()
        || checked_at_idx
            .and_then(|idx| row.get(idx))
            .is_some_and(|value| parse_timestamp(value).is_none());
    if torn {
        let line = row.position().map(|pos| pos.line()).unwrap_or_default();
        warn!(line, "skipping incomplete checkpoint row");
    }
    torn
}

fn ends_with_newline(file: &mut File, len: u64) -> io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// RFC 3339, or a naive ISO timestamp taken as UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
}
