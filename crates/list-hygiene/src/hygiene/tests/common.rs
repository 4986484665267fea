use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use reqwest::StatusCode;
use sea_orm::DbErr;

use crate::hygiene::directory::{DirectoryError, SubscriberDirectory};
use crate::hygiene::verifier::{EmailVerifier, VerificationError};
use crate::hygiene::BadResultTaxonomy;

/// In-memory `mailing_list`: email -> unsubscribed.
#[derive(Default)]
pub(super) struct MemoryDirectory {
    rows: Mutex<BTreeMap<String, bool>>,
    update_calls: Mutex<Vec<BTreeSet<String>>>,
    fail_updates: AtomicBool,
}

impl MemoryDirectory {
    pub(super) fn with_active(emails: &[&str]) -> Self {
        let directory = Self::default();
        {
            let mut rows = directory.rows.lock().expect("rows mutex poisoned");
            for email in emails {
                rows.insert(email.to_string(), false);
            }
        }
        directory
    }

    pub(super) fn insert(&self, email: &str, unsubscribed: bool) {
        self.rows
            .lock()
            .expect("rows mutex poisoned")
            .insert(email.to_string(), unsubscribed);
    }

    pub(super) fn is_unsubscribed(&self, email: &str) -> bool {
        self.rows
            .lock()
            .expect("rows mutex poisoned")
            .get(email)
            .copied()
            .unwrap_or(false)
    }

    pub(super) fn update_calls(&self) -> Vec<BTreeSet<String>> {
        self.update_calls
            .lock()
            .expect("update mutex poisoned")
            .clone()
    }

    pub(super) fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

impl SubscriberDirectory for MemoryDirectory {
    async fn list_active(&self) -> Result<BTreeSet<String>, DirectoryError> {
        let rows = self.rows.lock().expect("rows mutex poisoned");
        Ok(rows
            .iter()
            .filter(|(_, unsubscribed)| !**unsubscribed)
            .map(|(email, _)| email.to_lowercase())
            .collect())
    }

    async fn mark_unsubscribed(&self, emails: &BTreeSet<String>) -> Result<u64, DirectoryError> {
        self.update_calls
            .lock()
            .expect("update mutex poisoned")
            .push(emails.clone());
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(DirectoryError::Database(DbErr::Custom(
                "connection reset".to_string(),
            )));
        }

        let mut rows = self.rows.lock().expect("rows mutex poisoned");
        let mut updated = 0;
        for (email, unsubscribed) in rows.iter_mut() {
            if !*unsubscribed && emails.contains(&email.to_lowercase()) {
                *unsubscribed = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

/// Answers from a fixed table; unknown addresses fail with HTTP 503.
#[derive(Default)]
pub(super) struct ScriptedVerifier {
    answers: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedVerifier {
    pub(super) fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(email, result)| (email.to_string(), result.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

impl EmailVerifier for ScriptedVerifier {
    async fn check(&self, email: &str) -> Result<String, VerificationError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(email.to_string());
        self.answers
            .get(email)
            .cloned()
            .ok_or(VerificationError::Status(StatusCode::SERVICE_UNAVAILABLE))
    }
}

pub(super) fn taxonomy() -> BadResultTaxonomy {
    BadResultTaxonomy::new(["invalid", "disposable"])
}

pub(super) fn set(emails: &[&str]) -> BTreeSet<String> {
    emails.iter().map(|email| email.to_string()).collect()
}
