//! Daily polling of the tide program.

use chrono::Local;
use tokio_util::sync::CancellationToken;
use xt_core::time_to_next_poll;

use crate::staging::Staging;
use crate::tide::{TideError, TideProgram};

/// Runs the tide program once per local day and stages the results.
#[derive(Debug, Clone)]
pub struct Poller {
    program: TideProgram,
    staging: Staging,
}

impl Poller {
    pub const fn new(program: TideProgram, staging: Staging) -> Self {
        Self { program, staging }
    }

    /// Runs the tide program once and, on success, replaces the staged batch.
    ///
    /// A failed run leaves the staged batch untouched. Returns the number of
    /// events staged.
    pub async fn poll_once(&self) -> Result<usize, TideError> {
        let parsed = self.program.fetch().await?;
        let count = parsed.events.len();
        self.staging.replace(parsed.events);
        Ok(count)
    }

    /// Polls immediately, then again at every local midnight, until cancelled.
    ///
    /// Failures are logged and never end the loop.
    pub async fn run(self, cancel: CancellationToken) {
        let location = self.program.config().location.clone();
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                result = self.poll_once() => match result {
                    Ok(count) => tracing::info!(%location, count, "staged tidal events"),
                    Err(e) => tracing::error!(%location, error = %e, "polling tide failed"),
                },
            }

            let sleep_for = time_to_next_poll(&Local::now());
            tracing::info!(seconds = sleep_for.as_secs_f64(), "sleeping until next poll");
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(sleep_for) => {}
            }
        }
        tracing::debug!("poller stopped");
    }
}
