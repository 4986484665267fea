//! Hand-curated correction files (`email,unsubscribed,...`).

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::domain::{is_truthy, normalize_email};

#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    #[error("failed to read override file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid override CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("override file is missing the '{0}' column")]
    MissingColumn(&'static str),
}

/// Emails an override file flags as unsubscribed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideList {
    emails: BTreeSet<String>,
    rows: usize,
}

impl OverrideList {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, OverrideError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, OverrideError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let email_idx = header_index(&headers, "email")?;
        let flag_idx = header_index(&headers, "unsubscribed")?;

        let mut list = Self::default();
        for row in csv_reader.records() {
            let row = row?;
            list.rows += 1;

            if !row.get(flag_idx).is_some_and(is_truthy) {
                continue;
            }
            let email = normalize_email(row.get(email_idx).unwrap_or_default());
            if !email.is_empty() {
                list.emails.insert(email);
            }
        }

        Ok(list)
    }

    pub fn emails(&self) -> &BTreeSet<String> {
        &self.emails
    }

    /// Data rows read, flagged or not.
    pub fn rows_read(&self) -> usize {
        self.rows
    }
}

fn header_index(headers: &csv::StringRecord, name: &'static str) -> Result<usize, OverrideError> {
    headers
        .iter()
        .position(|header| {
            header
                .trim_start_matches('\u{feff}')
                .trim()
                .eq_ignore_ascii_case(name)
        })
        .ok_or(OverrideError::MissingColumn(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn truthy_rows_become_the_override_set() {
        let csv = "Name,Email,Unsubscribed\n\
Ann,ann@x.com,1\n\
Bob,BOB@x.com,TRUE\n\
Cy,cy@x.com,Yes\n\
Di,di@x.com,0\n\
Ed,ed@x.com,\n\
Flo,flo@x.com,no\n";
        let list = OverrideList::from_reader(Cursor::new(csv)).expect("parse");

        assert_eq!(list.rows_read(), 6);
        assert_eq!(
            list.emails().iter().map(String::as_str).collect::<Vec<_>>(),
            ["ann@x.com", "bob@x.com", "cy@x.com"]
        );
    }

    #[test]
    fn duplicates_and_blank_emails_are_dropped() {
        let csv = "email,unsubscribed\na@x.com,y\nA@X.com,t\n,true\n";
        let list = OverrideList::from_reader(Cursor::new(csv)).expect("parse");
        assert_eq!(list.emails().len(), 1);
    }

    #[test]
    fn missing_flag_column_is_an_error() {
        let error = OverrideList::from_reader(Cursor::new("email,name\na@x.com,A\n"))
            .expect_err("missing column");
        assert!(matches!(error, OverrideError::MissingColumn("unsubscribed")));
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let error = OverrideList::from_path("./does-not-exist.csv").expect_err("io error");
        assert!(matches!(error, OverrideError::Io(_)));
    }
}
