//! The pull/cancel/dispose iteration protocol.
//!
//! Every operator is an explicit state machine implementing [`AsyncIterator`]:
//! `advance` is the only suspension point, `current` is valid only after a
//! positive advance, and `dispose` releases the iterator and everything it
//! owns exactly once.
//!
//! Consumers never hold a bare `AsyncIterator`; [`Iter`] owns it and disposes
//! it on drop, so abandoning an iteration early still releases upstream
//! resources.

use futures::future::BoxFuture;

use crate::error::Result;

/// Lifecycle of one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IterState {
    #[default]
    NotStarted,
    Active,
    Completed,
    Faulted,
    Disposed,
}

impl IterState {
    /// Completed, faulted and disposed iterators only ever report exhaustion.
    pub fn can_advance(self) -> bool {
        matches!(self, IterState::NotStarted | IterState::Active)
    }

    /// Record the outcome of one resume step and pass it through.
    pub fn settle(&mut self, outcome: Result<bool>) -> Result<bool> {
        match outcome {
            Ok(true) => {
                *self = IterState::Active;
                Ok(true)
            }
            Ok(false) => {
                *self = IterState::Completed;
                Ok(false)
            }
            Err(err) => {
                *self = IterState::Faulted;
                Err(err)
            }
        }
    }

    /// Move to `Disposed`. Returns false when already disposed, in which case
    /// the caller must not release anything again.
    pub fn begin_dispose(&mut self) -> bool {
        if *self == IterState::Disposed {
            return false;
        }
        *self = IterState::Disposed;
        true
    }
}

/// Per-iteration state machine.
///
/// Invariants:
/// - At most one `advance` is outstanding at a time.
/// - After `advance` resolves to `Ok(false)` or `Err(_)`, further advances
///   resolve to `Ok(false)`.
/// - `dispose` is idempotent and disposes owned upstream iterators once.
pub trait AsyncIterator: Send {
    type Item;

    /// Resume until the next element is available (`true`) or the sequence
    /// is exhausted (`false`).
    fn advance(&mut self) -> BoxFuture<'_, Result<bool>>;

    /// The element produced by the last positive advance.
    fn current(&self) -> Option<&Self::Item>;

    /// Move the current element out. `current` is `None` afterwards until the
    /// next positive advance.
    fn take_current(&mut self) -> Option<Self::Item>;

    /// Release the iterator. Faults from local teardown and from upstream
    /// disposal are both reported.
    fn dispose(&mut self) -> Result<()>;
}

/// Owning handle to a running iteration.
pub struct Iter<T> {
    inner: Box<dyn AsyncIterator<Item = T>>,
    disposed: bool,
}

impl<T> Iter<T> {
    pub fn new<I>(iter: I) -> Self
    where
        I: AsyncIterator<Item = T> + 'static,
    {
        Self {
            inner: Box::new(iter),
            disposed: false,
        }
    }

    pub fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
        if self.disposed {
            return Box::pin(futures::future::ready(Ok(false)));
        }
        self.inner.advance()
    }

    pub fn current(&self) -> Option<&T> {
        if self.disposed {
            return None;
        }
        self.inner.current()
    }

    pub fn take_current(&mut self) -> Option<T> {
        if self.disposed {
            return None;
        }
        self.inner.take_current()
    }

    /// Advance and move the element out in one step.
    pub async fn next(&mut self) -> Result<Option<T>> {
        if self.advance().await? {
            Ok(self.take_current())
        } else {
            Ok(None)
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Dispose once; later calls are no-ops returning `Ok(())`.
    pub fn dispose(&mut self) -> Result<()> {
        if std::mem::replace(&mut self.disposed, true) {
            return Ok(());
        }
        self.inner.dispose()
    }
}

impl<T> Drop for Iter<T> {
    fn drop(&mut self) {
        if std::mem::replace(&mut self.disposed, true) {
            return;
        }
        // Drop cannot report; explicit `dispose` is the observable path.
        if let Err(err) = self.inner.dispose() {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %err, "iterator disposal failed while dropping");
            #[cfg(not(feature = "tracing"))]
            let _ = err;
        }
    }
}

impl<T> std::fmt::Debug for Iter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Iter")
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures::executor::block_on;

    use super::*;
    use crate::error::Error;

    struct Countdown {
        left: u32,
        current: Option<u32>,
        state: IterState,
        disposals: Arc<AtomicUsize>,
    }

    impl AsyncIterator for Countdown {
        type Item = u32;

        fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
            Box::pin(async move {
                if !self.state.can_advance() {
                    return Ok(false);
                }
                let step = if self.left == 0 {
                    Ok(false)
                } else if self.left == 99 {
                    Err(Error::fault("bad countdown"))
                } else {
                    self.current = Some(self.left);
                    self.left -= 1;
                    Ok(true)
                };
                self.state.settle(step)
            })
        }

        fn current(&self) -> Option<&u32> {
            self.current.as_ref()
        }

        fn take_current(&mut self) -> Option<u32> {
            self.current.take()
        }

        fn dispose(&mut self) -> Result<()> {
            if self.state.begin_dispose() {
                self.disposals.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn countdown(left: u32, disposals: &Arc<AtomicUsize>) -> Iter<u32> {
        Iter::new(Countdown {
            left,
            current: None,
            state: IterState::NotStarted,
            disposals: Arc::clone(disposals),
        })
    }

    #[test]
    fn exhausted_iterator_keeps_returning_false() {
        let disposals = Arc::new(AtomicUsize::new(0));
        let mut it = countdown(2, &disposals);
        block_on(async {
            assert_eq!(it.next().await.unwrap(), Some(2));
            assert_eq!(it.next().await.unwrap(), Some(1));
            assert_eq!(it.next().await.unwrap(), None);
            assert!(!it.advance().await.unwrap());
        });
    }

    #[test]
    fn faulted_iterator_is_terminal() {
        let disposals = Arc::new(AtomicUsize::new(0));
        let mut it = countdown(99, &disposals);
        block_on(async {
            assert!(it.advance().await.is_err());
            assert!(!it.advance().await.unwrap());
        });
    }

    #[test]
    fn dispose_is_idempotent_and_drop_disposes() {
        let disposals = Arc::new(AtomicUsize::new(0));
        let mut it = countdown(3, &disposals);
        it.dispose().unwrap();
        it.dispose().unwrap();
        assert_eq!(disposals.load(Ordering::SeqCst), 1);
        assert!(it.current().is_none());
        drop(it);
        assert_eq!(disposals.load(Ordering::SeqCst), 1);

        let abandoned = countdown(3, &disposals);
        drop(abandoned);
        assert_eq!(disposals.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn take_current_clears_current() {
        let disposals = Arc::new(AtomicUsize::new(0));
        let mut it = countdown(1, &disposals);
        block_on(async {
            assert!(it.advance().await.unwrap());
            assert_eq!(it.current(), Some(&1));
            assert_eq!(it.take_current(), Some(1));
            assert_eq!(it.current(), None);
        });
    }
}
