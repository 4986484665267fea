//! Subscriber list hygiene: checkpoint log, subscriber directory,
//! verification client, reconciliation, and the sweep tying them together.

pub mod checkpoint;
pub mod directory;
pub mod domain;
pub mod overrides;
pub mod reconcile;
pub mod subscriber;
pub mod sweep;
pub mod verifier;

#[cfg(test)]
mod tests;

pub use checkpoint::{CheckpointError, CheckpointLog, CheckpointStats};
pub use directory::{DirectoryError, SeaOrmDirectory, SubscriberDirectory};
pub use domain::{is_truthy, normalize_email, BadResultTaxonomy, CheckpointRecord};
pub use overrides::{OverrideError, OverrideList};
pub use reconcile::Reconciler;
pub use sweep::{replay_checkpoint, PersistenceError, ReplaySummary, Sweep, SweepSummary};
pub use verifier::{EmailVerifier, NeverBounceClient, Paced, VerificationError};
