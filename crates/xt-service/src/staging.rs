//! In-memory staging area between the poller and the persistence merge.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use xt_core::Event;

/// The most recently polled batch of events that has not been persisted yet.
///
/// Cloning yields another handle to the same batch. Every access goes through
/// a single mutex; the poller swaps the whole batch in one step, so readers
/// never see a partial batch.
#[derive(Debug, Clone, Default)]
pub struct Staging {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Staging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the staged batch wholesale.
    pub fn replace(&self, events: Vec<Event>) {
        let previous = std::mem::replace(&mut *self.lock(), events);
        if !previous.is_empty() {
            tracing::debug!(count = previous.len(), "replaced a batch that was never persisted");
        }
    }

    /// Number of staged events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the staged batch.
    pub fn snapshot(&self) -> Vec<Event> {
        self.lock().clone()
    }

    /// Locks the batch for a read-compare-clear sequence.
    ///
    /// The batch is only ever replaced wholesale, so a lock poisoned by a
    /// panicking holder still guards a complete batch and is recovered.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
