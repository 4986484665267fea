use crate::cli::{CheckpointArgs, OverrideArgs, SweepArgs};
use crate::{infra, render};
use list_hygiene::config::AppConfig;
use list_hygiene::error::AppError;
use list_hygiene::hygiene::{
    replay_checkpoint, CheckpointLog, CheckpointStats, NeverBounceClient, OverrideList,
    Reconciler, SeaOrmDirectory, Sweep,
};
use std::sync::Arc;
use tracing::info;

fn checkpoint_log(config: &AppConfig, args: CheckpointArgs) -> CheckpointLog {
    CheckpointLog::new(
        args.checkpoint
            .unwrap_or_else(|| config.sweep.checkpoint_path.clone()),
    )
}

pub(crate) async fn run_sweep(config: &AppConfig, args: SweepArgs) -> Result<(), AppError> {
    // credentials are checked before any work starts
    let api_key = config.verifier.api_key()?;
    config.database.url()?;

    let client = NeverBounceClient::new(
        config.verifier.endpoint.clone(),
        api_key,
        config.verifier.timeout,
    )?;
    let checkpoint = checkpoint_log(config, args.log);
    info!(path = %checkpoint.path().display(), "using checkpoint log");

    let db = infra::connect(&config.database).await?;
    let sweep = Sweep::new(
        Arc::new(SeaOrmDirectory::new(db.clone())),
        client,
        checkpoint,
        config.sweep.bad_results.clone(),
        config.sweep.min_interval,
    )
    .with_limit(args.limit)
    .with_stop_flag(infra::stop_on_ctrl_c());

    let outcome = sweep.run().await;
    drop(sweep);
    infra::close(db).await;

    let summary = outcome?;
    print!("{}", render::sweep_summary(&summary));
    Ok(())
}

pub(crate) async fn run_apply_overrides(
    config: &AppConfig,
    args: OverrideArgs,
) -> Result<(), AppError> {
    let list = OverrideList::from_path(&args.file)?;
    println!(
        "Found {} unsubscribed emails in {} ({} rows read).",
        list.emails().len(),
        args.file.display(),
        list.rows_read()
    );
    if list.emails().is_empty() {
        return Ok(());
    }

    let db = infra::connect(&config.database).await?;
    let reconciler = Reconciler::new(Arc::new(SeaOrmDirectory::new(db.clone())));
    let outcome = reconciler.reconcile(list.emails()).await;
    drop(reconciler);
    infra::close(db).await;

    println!("Updated {} rows.", outcome?);
    Ok(())
}

pub(crate) async fn run_replay(config: &AppConfig, args: CheckpointArgs) -> Result<(), AppError> {
    let checkpoint = checkpoint_log(config, args);
    let db = infra::connect(&config.database).await?;
    let reconciler = Reconciler::new(Arc::new(SeaOrmDirectory::new(db.clone())));
    let outcome = replay_checkpoint(&checkpoint, &reconciler).await;
    drop(reconciler);
    infra::close(db).await;

    let summary = outcome?;
    println!(
        "Bad addresses on record: {}\nRows updated: {}",
        summary.bad_on_record, summary.updated
    );
    Ok(())
}

pub(crate) fn run_stats(config: &AppConfig, args: CheckpointArgs) -> Result<(), AppError> {
    let checkpoint = checkpoint_log(config, args);
    let records = checkpoint.records()?;
    let stats = CheckpointStats::from_records(&records);
    print!(
        "{}",
        render::checkpoint_stats(&checkpoint.path().display().to_string(), &stats)
    );
    Ok(())
}
