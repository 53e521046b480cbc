//! Sequence sources: in-memory collections, single futures, and streams.
//!
//! Single-use producers (a future, a stream) are wrapped behind a factory
//! that is invoked anew for every iteration, so re-iterating re-evaluates.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::{Stream, StreamExt};

use pullseq_core::prelude::*;

/// Re-iterable sequence over an in-memory collection. Elements are cloned
/// into each iteration.
pub fn from_iter<I>(items: I) -> Seq<I::Item>
where
    I: IntoIterator,
    I::Item: Clone + Send + Sync + 'static,
{
    Seq::new(FromIter {
        items: items.into_iter().collect::<Vec<_>>().into(),
    })
}

/// Sequence with no elements.
pub fn empty<T: Send + 'static>() -> Seq<T> {
    Seq::new(Empty(std::marker::PhantomData))
}

/// One-element sequence produced by a future. `factory` runs on the first
/// advance of every iteration.
pub fn from_future<T, F, Fut>(factory: F) -> Seq<T>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Seq::new(FromFuture {
        factory: Arc::new(factory),
    })
}

/// Sequence adapting a fallible stream. `factory` subscribes on the first
/// advance of every iteration; disposal drops the stream.
pub fn from_stream<T, F, St>(factory: F) -> Seq<T>
where
    T: Send + 'static,
    F: Fn() -> St + Send + Sync + 'static,
    St: Stream<Item = Result<T>> + Send + 'static,
{
    Seq::new(FromStream {
        factory: Arc::new(factory),
    })
}

struct FromIter<T> {
    items: Arc<[T]>,
}

impl<T: Clone + Send + Sync + 'static> AsyncSequence for FromIter<T> {
    type Item = T;

    fn begin(&self, ctx: &Context) -> Iter<T> {
        Iter::new(SliceIter {
            items: Arc::clone(&self.items),
            pos: 0,
            token: ctx.token().clone(),
            current: None,
            state: IterState::NotStarted,
        })
    }
}

struct SliceIter<T> {
    items: Arc<[T]>,
    pos: usize,
    token: CancellationToken,
    current: Option<T>,
    state: IterState,
}

impl<T: Clone> SliceIter<T> {
    fn step(&mut self) -> Result<bool> {
        self.token.check()?;
        match self.items.get(self.pos) {
            Some(item) => {
                self.current = Some(item.clone());
                self.pos += 1;
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }
}

impl<T: Clone + Send + Sync> AsyncIterator for SliceIter<T> {
    type Item = T;

    fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
        let outcome = if self.state.can_advance() {
            let step = self.step();
            self.state.settle(step)
        } else {
            Ok(false)
        };
        Box::pin(futures::future::ready(outcome))
    }

    fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    fn take_current(&mut self) -> Option<T> {
        self.current.take()
    }

    fn dispose(&mut self) -> Result<()> {
        if self.state.begin_dispose() {
            self.current = None;
        }
        Ok(())
    }
}

struct Empty<T>(std::marker::PhantomData<fn() -> T>);

impl<T: Send + 'static> AsyncSequence for Empty<T> {
    type Item = T;

    fn begin(&self, ctx: &Context) -> Iter<T> {
        Iter::new(EmptyIter {
            token: ctx.token().clone(),
            state: IterState::NotStarted,
            _marker: std::marker::PhantomData,
        })
    }
}

struct EmptyIter<T> {
    token: CancellationToken,
    state: IterState,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Send> AsyncIterator for EmptyIter<T> {
    type Item = T;

    fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
        let outcome = if self.state.can_advance() {
            let step = self.token.check().map(|_| false);
            self.state.settle(step)
        } else {
            Ok(false)
        };
        Box::pin(futures::future::ready(outcome))
    }

    fn current(&self) -> Option<&T> {
        None
    }

    fn take_current(&mut self) -> Option<T> {
        None
    }

    fn dispose(&mut self) -> Result<()> {
        self.state.begin_dispose();
        Ok(())
    }
}

struct FromFuture<F> {
    factory: Arc<F>,
}

impl<T, F, Fut> AsyncSequence for FromFuture<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    type Item = T;

    fn begin(&self, ctx: &Context) -> Iter<T> {
        Iter::new(FutureIter {
            factory: Arc::clone(&self.factory),
            token: ctx.token().clone(),
            current: None,
            state: IterState::NotStarted,
        })
    }
}

struct FutureIter<F, T> {
    factory: Arc<F>,
    token: CancellationToken,
    current: Option<T>,
    state: IterState,
}

impl<T, F, Fut> FutureIter<F, T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    async fn step(&mut self) -> Result<bool> {
        if self.state != IterState::NotStarted {
            self.current = None;
            return Ok(false);
        }
        self.token.check()?;
        let value = (self.factory)().await?;
        self.current = Some(value);
        Ok(true)
    }
}

impl<T, F, Fut> AsyncIterator for FutureIter<F, T>
where
    T: Send,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send,
{
    type Item = T;

    fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            if !self.state.can_advance() {
                return Ok(false);
            }
            let step = self.step().await;
            self.state.settle(step)
        })
    }

    fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    fn take_current(&mut self) -> Option<T> {
        self.current.take()
    }

    fn dispose(&mut self) -> Result<()> {
        if self.state.begin_dispose() {
            self.current = None;
        }
        Ok(())
    }
}

struct FromStream<F> {
    factory: Arc<F>,
}

impl<T, F, St> AsyncSequence for FromStream<F>
where
    T: Send + 'static,
    F: Fn() -> St + Send + Sync + 'static,
    St: Stream<Item = Result<T>> + Send + 'static,
{
    type Item = T;

    fn begin(&self, ctx: &Context) -> Iter<T> {
        Iter::new(StreamIter {
            factory: Arc::clone(&self.factory),
            stream: None,
            token: ctx.token().clone(),
            current: None,
            state: IterState::NotStarted,
        })
    }
}

struct StreamIter<F, St, T> {
    factory: Arc<F>,
    stream: Option<Pin<Box<St>>>,
    token: CancellationToken,
    current: Option<T>,
    state: IterState,
}

impl<T, F, St> StreamIter<F, St, T>
where
    F: Fn() -> St,
    St: Stream<Item = Result<T>>,
{
    async fn step(&mut self) -> Result<bool> {
        self.token.check()?;
        let factory = &self.factory;
        let stream = self.stream.get_or_insert_with(|| Box::pin(factory()));
        match stream.next().await {
            Some(item) => {
                self.current = Some(item?);
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }
}

impl<T, F, St> AsyncIterator for StreamIter<F, St, T>
where
    T: Send,
    F: Fn() -> St + Send + Sync,
    St: Stream<Item = Result<T>> + Send,
{
    type Item = T;

    fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            if !self.state.can_advance() {
                return Ok(false);
            }
            let step = self.step().await;
            self.state.settle(step)
        })
    }

    fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    fn take_current(&mut self) -> Option<T> {
        self.current.take()
    }

    fn dispose(&mut self) -> Result<()> {
        if self.state.begin_dispose() {
            self.stream = None;
            self.current = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::executor::block_on;

    use super::*;
    use crate::fold::to_vec;

    #[test]
    fn from_iter_is_reiterable() {
        let seq = from_iter(vec![1, 2, 3]);
        let ctx = Context::new();
        assert_eq!(block_on(to_vec(&seq, &ctx)).unwrap(), vec![1, 2, 3]);
        assert_eq!(block_on(to_vec(&seq, &ctx)).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn from_iter_reports_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = Context::new().with_token(token);
        let err = block_on(to_vec(&from_iter(vec![1]), &ctx)).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn future_factory_runs_per_iteration() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let seq = from_future(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(n) }
        });
        let ctx = Context::new();
        assert_eq!(block_on(to_vec(&seq, &ctx)).unwrap(), vec![0]);
        assert_eq!(block_on(to_vec(&seq, &ctx)).unwrap(), vec![1]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stream_faults_propagate() {
        let seq = from_stream(|| {
            futures::stream::iter(vec![Ok(1), Err(Error::fault("stream broke")), Ok(3)])
        });
        let err = block_on(to_vec(&seq, &Context::new())).unwrap_err();
        assert_eq!(err.to_string(), "stream broke");
    }

    #[test]
    fn empty_yields_nothing() {
        let seq = empty::<u8>();
        assert!(block_on(to_vec(&seq, &Context::new())).unwrap().is_empty());
    }
}
