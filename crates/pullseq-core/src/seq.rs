//! Sequences: immutable, re-iterable pipeline descriptions.

use std::sync::Arc;

use crate::context::Context;
use crate::iter::Iter;

/// A pipeline description. Composing operators only builds sequences; no work
/// happens until `begin` is called and the returned iterator is advanced.
///
/// Every `begin` must produce independent iteration state: two iterations of
/// the same pure pipeline yield the same elements. Implementations are shared
/// across threads (`Sync`) and must not keep per-iteration state themselves.
pub trait AsyncSequence: Send + Sync {
    type Item;

    fn begin(&self, ctx: &Context) -> Iter<Self::Item>;

    /// Erase the concrete sequence type.
    fn into_seq(self) -> Seq<Self::Item>
    where
        Self: Sized + 'static,
    {
        Seq::new(self)
    }
}

/// Shared, type-erased sequence handle. Cloning is cheap.
pub struct Seq<T> {
    inner: Arc<dyn AsyncSequence<Item = T>>,
}

impl<T: 'static> Seq<T> {
    pub fn new<S>(seq: S) -> Self
    where
        S: AsyncSequence<Item = T> + 'static,
    {
        Self {
            inner: Arc::new(seq),
        }
    }
}

impl<T> Clone for Seq<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> AsyncSequence for Seq<T> {
    type Item = T;

    fn begin(&self, ctx: &Context) -> Iter<T> {
        self.inner.begin(ctx)
    }

    fn into_seq(self) -> Seq<T> {
        self
    }
}

impl<T> std::fmt::Debug for Seq<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seq").finish_non_exhaustive()
    }
}
