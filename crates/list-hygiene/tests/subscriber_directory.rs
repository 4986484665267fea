//! `SeaOrmDirectory` against an in-memory SQLite `mailing_list`.

use std::collections::BTreeSet;
use std::sync::Arc;

use list_hygiene::hygiene::subscriber;
use list_hygiene::hygiene::{Reconciler, SeaOrmDirectory, SubscriberDirectory};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbBackend, EntityTrait, Statement,
};

async fn setup_test_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"CREATE TABLE mailing_list (
            email TEXT PRIMARY KEY,
            name TEXT NULL,
            location TEXT NULL,
            info TEXT NULL,
            unsubscribed INTEGER NULL
        );"#,
    ))
    .await
    .expect("Failed to create mailing_list table");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"INSERT INTO mailing_list (email, name, location, info, unsubscribed) VALUES
            ('Ann@Example.com', 'Ann', 'Brooklyn', NULL, 0),
            ('bob@example.com', 'Bob', NULL, NULL, NULL),
            ('cy@example.com', 'Cy', NULL, 'met at a show', 1),
            ('di@example.com', 'Di', NULL, NULL, 0);"#,
    ))
    .await
    .expect("Failed to seed mailing_list");

    Arc::new(db)
}

fn set(emails: &[&str]) -> BTreeSet<String> {
    emails.iter().map(|email| email.to_string()).collect()
}

async fn unsubscribed(db: &DatabaseConnection, email: &str) -> Option<bool> {
    subscriber::Entity::find_by_id(email.to_string())
        .one(db)
        .await
        .expect("query subscriber")
        .expect("subscriber present")
        .unsubscribed
}

#[tokio::test]
async fn list_active_skips_unsubscribed_and_lowercases() {
    let db = setup_test_db().await;
    let directory = SeaOrmDirectory::new(db);

    let active = directory.list_active().await.expect("list active");

    assert_eq!(
        active,
        set(&["ann@example.com", "bob@example.com", "di@example.com"])
    );
}

#[tokio::test]
async fn mark_unsubscribed_matches_case_insensitively_and_is_idempotent() {
    let db = setup_test_db().await;
    let directory = SeaOrmDirectory::new(db.clone());
    let bad = set(&["ann@example.com", "bob@example.com", "nobody@example.com"]);

    let first = directory.mark_unsubscribed(&bad).await.expect("first update");
    let second = directory.mark_unsubscribed(&bad).await.expect("second update");

    assert_eq!(first, 2);
    assert_eq!(second, 0);
    assert_eq!(unsubscribed(&db, "Ann@Example.com").await, Some(true));
    assert_eq!(unsubscribed(&db, "bob@example.com").await, Some(true));
    assert_eq!(unsubscribed(&db, "di@example.com").await, Some(false));
}

#[tokio::test]
async fn padded_addresses_listed_as_active_can_be_unsubscribed() {
    let db = setup_test_db().await;
    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        "INSERT INTO mailing_list (email, unsubscribed) VALUES ('  Pad@Example.com ', 0);",
    ))
    .await
    .expect("insert padded row");
    let directory = SeaOrmDirectory::new(db.clone());

    assert!(directory
        .list_active()
        .await
        .expect("list active")
        .contains("pad@example.com"));

    let updated = directory
        .mark_unsubscribed(&set(&["pad@example.com"]))
        .await
        .expect("update");

    assert_eq!(updated, 1);
    assert_eq!(unsubscribed(&db, "  Pad@Example.com ").await, Some(true));
    assert!(!directory
        .list_active()
        .await
        .expect("list active")
        .contains("pad@example.com"));
}

#[tokio::test]
async fn already_unsubscribed_rows_are_left_alone() {
    let db = setup_test_db().await;
    let directory = SeaOrmDirectory::new(db.clone());

    let updated = directory
        .mark_unsubscribed(&set(&["cy@example.com"]))
        .await
        .expect("update");

    assert_eq!(updated, 0);
    assert_eq!(unsubscribed(&db, "cy@example.com").await, Some(true));
}

#[tokio::test]
async fn reconciler_over_sql_never_resets_the_flag() {
    let db = setup_test_db().await;
    let reconciler = Reconciler::new(Arc::new(SeaOrmDirectory::new(db.clone())));

    assert_eq!(
        reconciler.reconcile(&BTreeSet::new()).await.expect("empty"),
        0
    );
    assert_eq!(
        reconciler
            .reconcile(&set(&["di@example.com"]))
            .await
            .expect("reconcile"),
        1
    );

    let rows = subscriber::Entity::find()
        .all(db.as_ref())
        .await
        .expect("all rows");
    let flagged: Vec<_> = rows
        .iter()
        .filter(|row| row.unsubscribed == Some(true))
        .map(|row| row.email.as_str())
        .collect();
    assert_eq!(flagged.len(), 2);
    assert!(flagged.contains(&"cy@example.com"));
    assert!(flagged.contains(&"di@example.com"));
}
