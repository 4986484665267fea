//! Mailing-list hygiene: re-verify subscriber addresses against a reputation
//! service, checkpoint every outcome, and reconcile bad addresses back into
//! the system of record.

pub mod config;
pub mod error;
pub mod hygiene;
pub mod telemetry;
