use list_hygiene::config::DatabaseConfig;
use list_hygiene::error::AppError;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub(crate) async fn connect(config: &DatabaseConfig) -> Result<Arc<DatabaseConnection>, AppError> {
    let mut options = ConnectOptions::new(config.url()?);
    options
        .max_connections(2)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    debug!("connected to the system of record");
    Ok(Arc::new(db))
}

pub(crate) async fn close(db: Arc<DatabaseConnection>) {
    match Arc::try_unwrap(db) {
        Ok(db) => {
            if let Err(err) = db.close().await {
                warn!(error = %err, "failed to close database connection");
            }
        }
        Err(_) => debug!("database connection still shared, leaving it to drop"),
    }
}

/// Flag set on the first Ctrl-C; the sweep checks it between addresses.
/// A second Ctrl-C exits at once with status 130.
pub(crate) fn stop_on_ctrl_c() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    tokio::spawn(watch_interrupts(stop.clone(), tokio::signal::ctrl_c, || {
        std::process::exit(130);
    }));
    stop
}

async fn watch_interrupts<S, Fut, F>(stop: Arc<AtomicBool>, mut next_signal: S, force_exit: F)
where
    S: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
    F: FnOnce(),
{
    if next_signal().await.is_err() {
        return;
    }
    info!("interrupt received, finishing the current address");
    stop.store(true, Ordering::Release);

    if next_signal().await.is_ok() {
        warn!("second interrupt received, exiting without reconciling");
        force_exit();
    }
}
