use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical form used for every email comparison: trimmed and lower-cased.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Spellings accepted as "true" in hand-edited files.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "t" | "yes" | "y"
    )
}

/// One durable line of the checkpoint log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub email: String,
    pub result: String,
    pub is_bad: bool,
    pub checked_at: DateTime<Utc>,
}

impl CheckpointRecord {
    pub fn new(email: &str, result: String, taxonomy: &BadResultTaxonomy) -> Self {
        let is_bad = taxonomy.is_bad(&result);
        Self {
            email: normalize_email(email),
            result,
            is_bad,
            checked_at: Utc::now(),
        }
    }
}

/// Verification outcomes that disqualify an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadResultTaxonomy {
    results: BTreeSet<String>,
}

impl BadResultTaxonomy {
    pub fn new<I, S>(results: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let results = results
            .into_iter()
            .map(|value| value.as_ref().trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .collect();
        Self { results }
    }

    /// Comma-separated form used by configuration.
    pub fn parse_list(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn is_bad(&self, result: &str) -> bool {
        self.results.contains(&result.trim().to_ascii_lowercase())
    }

    pub fn results(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(String::as_str)
    }
}

impl Default for BadResultTaxonomy {
    fn default() -> Self {
        Self::new(["invalid", "disposable", "spamtrap", "unknown"])
    }
}
