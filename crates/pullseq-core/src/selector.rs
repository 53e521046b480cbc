//! Key selectors.
//!
//! Operators consume one capability, [`KeySelect::evaluate`], and never care
//! whether the user supplied a plain closure, an async closure, or an async
//! closure that also wants the cancellation token. The three shapes are thin
//! adapters over that capability.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{ready, BoxFuture, Either, Ready};

use crate::cancel::CancellationToken;
use crate::error::Result;

/// Future returned by [`KeySelect::evaluate`]. Synchronous selectors resolve
/// immediately without allocating.
pub type KeyFuture<K> = Either<Ready<Result<K>>, BoxFuture<'static, Result<K>>>;

/// Compute a key for an element. The returned future must not borrow the
/// element; selectors copy out whatever they need.
pub trait KeySelect<T, K>: Send + Sync {
    fn evaluate(&self, item: &T, token: &CancellationToken) -> KeyFuture<K>;
}

struct SyncKey<F>(F);

impl<T, K, F> KeySelect<T, K> for SyncKey<F>
where
    F: Fn(&T) -> Result<K> + Send + Sync,
{
    fn evaluate(&self, item: &T, _token: &CancellationToken) -> KeyFuture<K> {
        Either::Left(ready((self.0)(item)))
    }
}

struct AsyncKey<F, Fut>(F, PhantomData<fn() -> Fut>);

impl<T, K, F, Fut> KeySelect<T, K> for AsyncKey<F, Fut>
where
    F: Fn(&T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<K>> + Send + 'static,
{
    fn evaluate(&self, item: &T, _token: &CancellationToken) -> KeyFuture<K> {
        Either::Right(Box::pin((self.0)(item)))
    }
}

struct CancellableKey<F, Fut>(F, PhantomData<fn() -> Fut>);

impl<T, K, F, Fut> KeySelect<T, K> for CancellableKey<F, Fut>
where
    F: Fn(&T, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<K>> + Send + 'static,
{
    fn evaluate(&self, item: &T, token: &CancellationToken) -> KeyFuture<K> {
        Either::Right(Box::pin((self.0)(item, token.clone())))
    }
}

/// Shared handle to a key selector of any shape.
pub struct Selector<T, K> {
    inner: Arc<dyn KeySelect<T, K>>,
}

impl<T: 'static, K: 'static> Selector<T, K> {
    /// Infallible synchronous selector.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::try_sync(move |item: &T| Ok(f(item)))
    }

    /// Synchronous selector that may fault.
    pub fn try_sync<F>(f: F) -> Self
    where
        F: Fn(&T) -> Result<K> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(SyncKey(f)),
        }
    }

    /// Asynchronous selector.
    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<K>> + Send + 'static,
    {
        Self {
            inner: Arc::new(AsyncKey(f, PhantomData)),
        }
    }

    /// Asynchronous selector that receives the iteration's cancellation token.
    pub fn cancellable<F, Fut>(f: F) -> Self
    where
        F: Fn(&T, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<K>> + Send + 'static,
    {
        Self {
            inner: Arc::new(CancellableKey(f, PhantomData)),
        }
    }

    /// Wrap a hand-written [`KeySelect`] implementation.
    pub fn from_arc(inner: Arc<dyn KeySelect<T, K>>) -> Self {
        Self { inner }
    }
}

impl<T, K> Selector<T, K> {
    pub fn evaluate(&self, item: &T, token: &CancellationToken) -> KeyFuture<K> {
        self.inner.evaluate(item, token)
    }
}

impl<T, K> Clone for Selector<T, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
