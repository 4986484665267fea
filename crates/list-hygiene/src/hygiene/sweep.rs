//! The checkpointed verification sweep.
//!
//! Each outcome is appended to the checkpoint log before anything acts on it,
//! so a crash can only defer reconciliation, never repeat a paid check.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::checkpoint::{CheckpointError, CheckpointLog};
use super::directory::{DirectoryError, SubscriberDirectory};
use super::domain::{BadResultTaxonomy, CheckpointRecord};
use super::reconcile::Reconciler;
use super::verifier::{EmailVerifier, Paced};

/// Failures that end a run: without durable writes the job cannot resume safely.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Counts reported at the end of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Active subscribers in the system of record.
    pub total: usize,
    /// Distinct addresses already in the checkpoint log.
    pub already_checked: usize,
    /// Active addresses missing from the checkpoint log at start.
    pub remaining: usize,
    pub checked: usize,
    pub failed: usize,
    pub newly_bad: usize,
    /// Bad addresses from earlier runs that were still active.
    pub carried_over: usize,
    pub updated: u64,
    pub interrupted: bool,
}

impl SweepSummary {
    /// Addresses still unchecked after this run.
    pub fn left_over(&self) -> usize {
        self.remaining - self.checked
    }
}

pub struct Sweep<D, V> {
    directory: Arc<D>,
    verifier: Paced<V>,
    checkpoint: CheckpointLog,
    taxonomy: BadResultTaxonomy,
    limit: Option<usize>,
    stop: Arc<AtomicBool>,
}

impl<D, V> Sweep<D, V>
where
    D: SubscriberDirectory,
    V: EmailVerifier,
{
    pub fn new(
        directory: Arc<D>,
        verifier: V,
        checkpoint: CheckpointLog,
        taxonomy: BadResultTaxonomy,
        min_interval: Duration,
    ) -> Self {
        Self {
            directory,
            verifier: Paced::new(verifier, min_interval),
            checkpoint,
            taxonomy,
            limit: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check at most `limit` pending addresses this run.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Polled between addresses; once set the sweep stops and reconciles
    /// what it has found so far.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn verifier(&self) -> &V {
        self.verifier.inner()
    }

    pub async fn run(&self) -> Result<SweepSummary, PersistenceError> {
        let scan = self.checkpoint.scan()?;
        let active = self.directory.list_active().await?;
        let pending: Vec<&String> = active
            .iter()
            .filter(|email| !scan.checked.contains(*email))
            .collect();

        // bad on record but still active: an earlier reconciliation never landed
        let carried_over: BTreeSet<String> = scan.bad.intersection(&active).cloned().collect();

        let mut summary = SweepSummary {
            total: active.len(),
            already_checked: scan.checked.len(),
            remaining: pending.len(),
            carried_over: carried_over.len(),
            ..SweepSummary::default()
        };
        info!(
            total = summary.total,
            already_checked = summary.already_checked,
            remaining = summary.remaining,
            carried_over = summary.carried_over,
            "starting verification sweep"
        );

        let batch = self.limit.unwrap_or(pending.len()).min(pending.len());
        let mut newly_bad = BTreeSet::new();

        for (position, email) in pending.into_iter().take(batch).enumerate() {
            if self.stop.load(Ordering::Acquire) {
                warn!(checked = summary.checked, "sweep interrupted");
                summary.interrupted = true;
                break;
            }

            match self.verifier.check(email).await {
                Ok(result) => {
                    let record = CheckpointRecord::new(email, result, &self.taxonomy);
                    self.checkpoint.append(&record)?;
                    summary.checked += 1;
                    info!("[{}/{}] {} -> {}", position + 1, batch, email, record.result);

                    if record.is_bad {
                        newly_bad.insert(record.email);
                    }
                }
                Err(err) => {
                    summary.failed += 1;
                    warn!(%email, error = %err, "verification failed, leaving address for the next run");
                }
            }
        }

        summary.newly_bad = newly_bad.len();
        let mut to_unsubscribe = newly_bad;
        to_unsubscribe.extend(carried_over);
        summary.updated = Reconciler::new(self.directory.clone())
            .reconcile(&to_unsubscribe)
            .await?;

        Ok(summary)
    }
}

/// Outcome of reapplying a checkpoint log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub bad_on_record: usize,
    pub updated: u64,
}

/// Reconcile every address the log marks bad, with no verification calls.
/// This is the retry path after a run whose reconciliation failed.
pub async fn replay_checkpoint<D>(
    checkpoint: &CheckpointLog,
    reconciler: &Reconciler<D>,
) -> Result<ReplaySummary, PersistenceError>
where
    D: SubscriberDirectory,
{
    let bad = checkpoint.bad_emails()?;
    let updated = reconciler.reconcile(&bad).await?;
    Ok(ReplaySummary {
        bad_on_record: bad.len(),
        updated,
    })
}
