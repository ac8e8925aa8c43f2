//! Wiring of the poller and the archive-period merge into one service.

use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use xt_db::{Database, DbError, EventStore};

use crate::config::ServiceConfig;
use crate::merge::Merger;
use crate::poller::Poller;
use crate::staging::Staging;
use crate::tide::TideProgram;

/// Errors that stop the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The database could not be opened or has the wrong schema.
    #[error("database {path}: {source}")]
    Database {
        path: String,
        #[source]
        source: DbError,
    },
    /// A background task panicked.
    #[error("background task failed: {0}")]
    Join(#[from] JoinError),
}

/// Runs the tide service until `cancel` fires.
///
/// The poller fetches immediately and then every local midnight; every
/// `archive_interval` the staged batch is merged into the database. On
/// shutdown a final merge persists anything still staged.
pub async fn run(config: ServiceConfig, cancel: CancellationToken) -> Result<(), ServiceError> {
    let db = Database::open(&config.database_path).map_err(|source| ServiceError::Database {
        path: config.database_path.display().to_string(),
        source,
    })?;
    tracing::info!(
        location = %config.tide.location,
        prog = %config.tide.prog.display(),
        days = config.tide.days,
        database = %config.database_path.display(),
        "starting tide service"
    );

    let staging = Staging::new();
    let poller_cancel = cancel.child_token();
    let poller = Poller::new(TideProgram::new(config.tide), staging.clone());
    let poller_handle = tokio::spawn(poller.run(poller_cancel.clone()));

    let merged = archive_periods(
        Merger::new(staging, db),
        config.archive_interval,
        &cancel,
    )
    .await;

    tracing::info!("shutting down tide service");
    poller_cancel.cancel();
    poller_handle.await?;
    end_archive_period(merged?).await?;
    Ok(())
}

/// Merges at the end of every archive period until `cancel` fires, then
/// hands the merger back for a final merge.
async fn archive_periods<S>(
    mut merger: Merger<S>,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<Merger<S>, JoinError>
where
    S: EventStore + Send + 'static,
{
    let mut archive = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    archive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => return Ok(merger),
            _ = archive.tick() => {
                merger = end_archive_period(merger).await?;
            }
        }
    }
}

/// Runs one merge on the blocking pool, handing the merger back.
async fn end_archive_period<S>(mut merger: Merger<S>) -> Result<Merger<S>, JoinError>
where
    S: EventStore + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        merger.end_archive_period();
        merger
    })
    .await
}
