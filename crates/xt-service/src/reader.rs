//! Read access to stored events for presentation.

use std::time::Duration;

use chrono::TimeZone;
use xt_core::{Event, TideRow};
use xt_db::EventStore;

/// How many times and how patiently to retry a contended read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            pause: Duration::from_secs(1),
        }
    }
}

/// Returns stored events ordered by timestamp, at most `max_events` of them.
///
/// Lock contention is retried according to `policy`. When every attempt
/// fails, or the error is not contention, the error is logged and an empty
/// list is returned; callers cannot tell that apart from an empty store.
pub fn fetch_events<S: EventStore + ?Sized>(
    store: &S,
    max_events: Option<usize>,
    policy: RetryPolicy,
) -> Vec<Event> {
    let attempts = policy.attempts.max(1);
    for attempt in 1..=attempts {
        match store.load_events(max_events) {
            Ok(events) => return events,
            Err(e) if e.is_transient() && attempt < attempts => {
                tracing::info!(attempt, error = %e, "fetching tidal events failed, retrying");
                std::thread::sleep(policy.pause);
            }
            Err(e) => {
                tracing::error!(attempt, error = %e, "fetching tidal events failed");
                break;
            }
        }
    }
    Vec::new()
}

/// [`fetch_events`] converted into display rows in `tz`.
pub fn fetch_rows<S: EventStore + ?Sized, Tz: TimeZone>(
    store: &S,
    max_events: Option<usize>,
    policy: RetryPolicy,
    tz: &Tz,
) -> Vec<TideRow> {
    fetch_events(store, max_events, policy)
        .iter()
        .filter_map(|event| TideRow::from_event(event, tz))
        .collect()
}
