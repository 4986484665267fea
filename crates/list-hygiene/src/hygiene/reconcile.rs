use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use super::directory::{DirectoryError, SubscriberDirectory};

/// Applies a bad-address set to the system of record.
///
/// Only ever sets `unsubscribed`; re-applying the same set is harmless and
/// reports zero changed rows the second time.
pub struct Reconciler<D> {
    directory: Arc<D>,
}

impl<D> Reconciler<D>
where
    D: SubscriberDirectory,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    pub async fn reconcile(&self, bad_emails: &BTreeSet<String>) -> Result<u64, DirectoryError> {
        if bad_emails.is_empty() {
            info!("no addresses to unsubscribe");
            return Ok(0);
        }

        let updated = self.directory.mark_unsubscribed(bad_emails).await?;
        info!(
            requested = bad_emails.len(),
            updated, "marked addresses unsubscribed"
        );
        Ok(updated)
    }
}
