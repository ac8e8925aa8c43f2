//! Test-service command: one poll and merge against a throwaway database.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;
use xt_db::Database;
use xt_service::{Merger, Poller, RetryPolicy, Staging, TideProgram, fetch_events};

use crate::commands::util::write_record;
use crate::{Config, TideArgs};

/// Wires up the poller and merge with a temporary database, polls once,
/// merges, and prints whatever the read path returns.
pub async fn run<W: Write>(writer: &mut W, config: &Config, args: &TideArgs) -> Result<usize> {
    let tide = config
        .tide_config(args.location.as_deref(), args.prog.as_deref(), args.days)
        .context("invalid tide configuration")?;

    let temp = tempfile::tempdir().context("failed to create temporary directory")?;
    let db_path = temp.path().join("xtide.sdb");
    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    let staging = Staging::new();
    let poller = Poller::new(TideProgram::new(tide), staging.clone());
    let staged = poller.poll_once().await.context("call to tide failed")?;
    tracing::info!(count = staged, "polled tidal events");

    let mut merger = Merger::new(staging, db);
    let outcome = merger.merge().context("failed to save tidal events")?;
    tracing::info!(?outcome, "merged tidal events");

    let events = fetch_events(merger.store(), None, RetryPolicy::default());
    for event in &events {
        write_record(writer, event, &Local)?;
    }
    Ok(events.len())
}
