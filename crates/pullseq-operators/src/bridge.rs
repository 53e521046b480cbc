//! Bridges out of the pull protocol.
//!
//! - [`into_stream`] exposes one iteration as a `futures::Stream`.
//! - `subscribe` (feature `rt`) drives one iteration on a tokio task and
//!   pushes its elements into an [`Observer`].

use futures::Stream;

use pullseq_core::prelude::*;

/// Begin one iteration and expose it as a stream of results. The iterator is
/// disposed when the stream ends or faults, and when the stream is dropped.
/// A disposal fault is yielded as the final item.
pub fn into_stream<S>(seq: &S, ctx: &Context) -> impl Stream<Item = Result<S::Item>> + Send
where
    S: AsyncSequence,
    S::Item: Send + 'static,
{
    let it = seq.begin(ctx);
    futures::stream::unfold(Some(it), |state| async move {
        let mut it = state?;
        match it.next().await {
            Ok(Some(item)) => Some((Ok(item), Some(it))),
            Ok(None) => it.dispose().err().map(|err| (Err(err), None)),
            Err(err) => {
                let err = match it.dispose() {
                    Ok(()) => err,
                    Err(disposal) => err.and(disposal),
                };
                Some((Err(err), None))
            }
        }
    })
}

#[cfg(feature = "rt")]
pub use push::{subscribe, Observer, Subscription};

#[cfg(feature = "rt")]
mod push {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use tokio::task::JoinHandle;

    use pullseq_core::prelude::*;
    use pullseq_core::{settle, LateErrorPolicy};

    /// Push-side consumer. Exactly one of `on_error` / `on_completed` is
    /// called, unless the subscription was cancelled first.
    pub trait Observer<T>: Send + 'static {
        fn on_next(&mut self, item: T);
        fn on_error(&mut self, err: Error);
        fn on_completed(&mut self);
    }

    /// Handle to a running subscription.
    #[derive(Debug)]
    pub struct Subscription {
        token: CancellationToken,
        unsubscribed: Arc<AtomicBool>,
        handle: JoinHandle<()>,
    }

    impl Subscription {
        /// Stop delivering elements and cancel the iteration. The driver task
        /// still disposes the iterator.
        pub fn unsubscribe(&self) {
            self.unsubscribed.store(true, Ordering::SeqCst);
            self.token.cancel();
        }

        pub fn is_unsubscribed(&self) -> bool {
            self.unsubscribed.load(Ordering::SeqCst)
        }

        /// Wait for the driver task to finish.
        pub async fn join(self) -> Result<()> {
            self.handle.await.map_err(Error::external)
        }
    }

    /// Drive one iteration of `seq` on a tokio task. The iteration runs under
    /// a child of the context's token, so unsubscribing never cancels the
    /// caller's token.
    pub fn subscribe<S, O>(seq: &S, ctx: &Context, observer: O) -> Subscription
    where
        S: AsyncSequence,
        S::Item: Send + 'static,
        O: Observer<S::Item>,
    {
        let token = ctx.token().child_token();
        let run_ctx = ctx.clone().with_token(token.clone());
        let it = seq.begin(&run_ctx);
        let unsubscribed = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(drive(
            it,
            observer,
            Arc::clone(&unsubscribed),
            ctx.config().late_error_policy,
        ));
        Subscription {
            token,
            unsubscribed,
            handle,
        }
    }

    async fn drive<T, O>(
        mut it: Iter<T>,
        mut observer: O,
        unsubscribed: Arc<AtomicBool>,
        policy: LateErrorPolicy,
    ) where
        T: Send + 'static,
        O: Observer<T>,
    {
        let outcome = loop {
            if unsubscribed.load(Ordering::SeqCst) {
                break Ok(());
            }
            match it.next().await {
                Ok(Some(item)) => {
                    if unsubscribed.load(Ordering::SeqCst) {
                        break Ok(());
                    }
                    observer.on_next(item);
                }
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        let outcome = settle(outcome, it.dispose());

        if !unsubscribed.load(Ordering::SeqCst) {
            match outcome {
                Ok(()) => observer.on_completed(),
                Err(err) => observer.on_error(err),
            }
            return;
        }
        match outcome {
            Ok(()) => {}
            Err(err) if err.is_cancelled() => {}
            Err(err) => late_fault::<T, O>(err, policy, &mut observer),
        }
    }

    fn late_fault<T, O: Observer<T>>(err: Error, policy: LateErrorPolicy, observer: &mut O) {
        match policy {
            LateErrorPolicy::Ignore => {}
            LateErrorPolicy::Log => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "fault after unsubscribe");
                #[cfg(not(feature = "tracing"))]
                let _ = err;
            }
            LateErrorPolicy::Forward => observer.on_error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use futures::StreamExt;

    use super::*;
    use crate::source::from_iter;
    use crate::tracking::DisposeTracker;

    #[test]
    fn stream_yields_then_disposes() {
        let tracker = DisposeTracker::new();
        let seq = tracker.track(from_iter(vec![1, 2, 3]));
        let items: Vec<i32> = block_on(
            into_stream(&seq, &Context::new())
                .map(|r| r.unwrap())
                .collect::<Vec<_>>(),
        );
        assert_eq!(items, vec![1, 2, 3]);
        assert!(tracker.balanced());
    }

    #[test]
    fn dropped_stream_disposes() {
        let tracker = DisposeTracker::new();
        let seq = tracker.track(from_iter(vec![1, 2, 3]));
        let first = block_on(async {
            let mut stream = Box::pin(into_stream(&seq, &Context::new()));
            stream.next().await
        });
        assert_eq!(first.map(|r| r.unwrap()), Some(1));
        assert!(tracker.balanced());
    }
}
