//! Begin/dispose accounting for sequences.
//!
//! Wrap any sequence with [`DisposeTracker::track`] to count how many
//! iterations it started and how many of them were released. Useful for
//! asserting that operators release everything they open, including on
//! faults and early abandonment.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use pullseq_core::prelude::*;

#[derive(Default)]
struct Counters {
    begun: AtomicUsize,
    disposed: AtomicUsize,
    dispose_fault: Mutex<Option<String>>,
}

/// Shared counters. Clones observe the same totals.
#[derive(Clone, Default)]
pub struct DisposeTracker {
    counters: Arc<Counters>,
}

impl DisposeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every tracked iterator fault with `msg` when disposed. The
    /// disposal is still counted.
    pub fn fail_disposal_with(&self, msg: impl Into<String>) {
        if let Ok(mut slot) = self.counters.dispose_fault.lock() {
            *slot = Some(msg.into());
        }
    }

    pub fn track<S>(&self, source: S) -> Seq<S::Item>
    where
        S: AsyncSequence + 'static,
        S::Item: Send + 'static,
    {
        Seq::new(Tracked {
            source: source.into_seq(),
            tracker: self.clone(),
        })
    }

    pub fn begun(&self) -> usize {
        self.counters.begun.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.counters.disposed.load(Ordering::SeqCst)
    }

    /// True when every started iteration was released.
    pub fn balanced(&self) -> bool {
        self.begun() == self.disposed()
    }
}

impl std::fmt::Debug for DisposeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposeTracker")
            .field("begun", &self.begun())
            .field("disposed", &self.disposed())
            .finish()
    }
}

struct Tracked<T> {
    source: Seq<T>,
    tracker: DisposeTracker,
}

impl<T: Send + 'static> AsyncSequence for Tracked<T> {
    type Item = T;

    fn begin(&self, ctx: &Context) -> Iter<T> {
        self.tracker.counters.begun.fetch_add(1, Ordering::SeqCst);
        Iter::new(TrackedIter {
            inner: self.source.begin(ctx),
            tracker: self.tracker.clone(),
            disposed: false,
        })
    }
}

struct TrackedIter<T> {
    inner: Iter<T>,
    tracker: DisposeTracker,
    disposed: bool,
}

impl<T: Send> AsyncIterator for TrackedIter<T> {
    type Item = T;

    fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
        self.inner.advance()
    }

    fn current(&self) -> Option<&T> {
        self.inner.current()
    }

    fn take_current(&mut self) -> Option<T> {
        self.inner.take_current()
    }

    fn dispose(&mut self) -> Result<()> {
        if std::mem::replace(&mut self.disposed, true) {
            return Ok(());
        }
        let outcome = self.inner.dispose();
        self.tracker.counters.disposed.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .tracker
            .counters
            .dispose_fault
            .lock()
            .ok()
            .and_then(|slot| slot.clone());
        match injected {
            Some(msg) => pullseq_core::settle(outcome, Err(Error::fault(msg))),
            None => outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::source::from_iter;

    #[test]
    fn counts_begin_and_dispose() {
        let tracker = DisposeTracker::new();
        let seq = tracker.track(from_iter(vec![1, 2, 3]));
        let mut it = seq.begin(&Context::new());
        assert_eq!(tracker.begun(), 1);
        assert!(!tracker.balanced());
        block_on(it.advance()).unwrap();
        drop(it);
        assert!(tracker.balanced());
    }

    #[test]
    fn injected_disposal_fault_is_reported() {
        let tracker = DisposeTracker::new();
        tracker.fail_disposal_with("close failed");
        let mut it = tracker.track(from_iter(vec![1])).begin(&Context::new());
        assert_eq!(it.dispose().unwrap_err().to_string(), "close failed");
        assert_eq!(tracker.disposed(), 1);
    }
}
