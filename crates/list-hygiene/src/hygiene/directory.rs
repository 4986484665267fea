use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};

use super::domain::normalize_email;
use super::subscriber;

/// Keeps each `IN (...)` list well under driver bind-parameter limits.
const UPDATE_CHUNK: usize = 5_000;

/// Read/write contract the hygiene job needs from the system of record.
pub trait SubscriberDirectory: Send + Sync {
    /// Normalized emails of every subscriber not flagged unsubscribed.
    fn list_active(&self) -> impl Future<Output = Result<BTreeSet<String>, DirectoryError>> + Send;

    /// Set `unsubscribed = true` for every listed email in one batch.
    /// Returns the number of rows that changed state.
    fn mark_unsubscribed(
        &self,
        emails: &BTreeSet<String>,
    ) -> impl Future<Output = Result<u64, DirectoryError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// `SubscriberDirectory` over a sea-orm connection.
#[derive(Clone)]
pub struct SeaOrmDirectory {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmDirectory {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// `lower(trim(email))`, the stored address in the form `list_active` reports.
fn normalized_email() -> SimpleExpr {
    Func::lower(Func::cust(Alias::new("TRIM")).arg(Expr::col(subscriber::Column::Email))).into()
}

fn still_subscribed() -> Condition {
    Condition::any()
        .add(subscriber::Column::Unsubscribed.eq(false))
        .add(subscriber::Column::Unsubscribed.is_null())
}

impl SubscriberDirectory for SeaOrmDirectory {
    #[tracing::instrument(skip(self))]
    async fn list_active(&self) -> Result<BTreeSet<String>, DirectoryError> {
        let emails: Vec<String> = subscriber::Entity::find()
            .select_only()
            .column(subscriber::Column::Email)
            .filter(still_subscribed())
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        Ok(emails
            .iter()
            .map(|email| normalize_email(email))
            .filter(|email| !email.is_empty())
            .collect())
    }

    #[tracing::instrument(skip(self, emails), fields(count = emails.len()))]
    async fn mark_unsubscribed(&self, emails: &BTreeSet<String>) -> Result<u64, DirectoryError> {
        let emails: Vec<String> = emails.iter().map(|email| normalize_email(email)).collect();
        let txn = self.db.begin().await?;
        let mut updated = 0;

        for chunk in emails.chunks(UPDATE_CHUNK) {
            let result = subscriber::Entity::update_many()
                .col_expr(subscriber::Column::Unsubscribed, Expr::value(true))
                .filter(Expr::expr(normalized_email()).is_in(chunk.iter().cloned()))
                .filter(still_subscribed())
                .exec(&txn)
                .await?;
            updated += result.rows_affected;
        }

        txn.commit().await?;
        Ok(updated)
    }
}
