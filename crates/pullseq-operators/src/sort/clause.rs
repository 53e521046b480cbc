//! Sort clauses: a key selector, a key comparer and a direction.
//!
//! The key type is erased behind [`SortClause`] so one ordered sequence can
//! chain clauses with different key types. Per iteration each clause opens a
//! [`KeyColumn`] that stores the evaluated key of every buffered element;
//! comparisons then run on buffer indices.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::future::BoxFuture;

use pullseq_core::prelude::*;

/// Type-erased clause.
pub trait SortClause<T>: Send + Sync {
    fn column(&self, capacity: usize) -> Box<dyn KeyColumn<T>>;
    fn direction(&self) -> SortDirection;
}

/// Evaluated keys for one clause, indexed like the sort buffer.
pub trait KeyColumn<T>: Send {
    /// Evaluate and store the key of the next buffered element. The future
    /// does not borrow `item`.
    fn push(&mut self, item: &T, token: &CancellationToken) -> BoxFuture<'_, Result<()>>;

    /// Compare the keys at two buffer positions, direction applied.
    fn compare(&self, a: usize, b: usize) -> Result<Ordering>;
}

struct KeyedClause<T, K> {
    selector: Selector<T, K>,
    comparer: Comparer<K>,
    direction: SortDirection,
}

impl<T: 'static, K: Send + 'static> SortClause<T> for KeyedClause<T, K> {
    fn column(&self, capacity: usize) -> Box<dyn KeyColumn<T>> {
        Box::new(KeyVec {
            keys: Vec::with_capacity(capacity),
            selector: self.selector.clone(),
            comparer: self.comparer.clone(),
            direction: self.direction,
        })
    }

    fn direction(&self) -> SortDirection {
        self.direction
    }
}

struct KeyVec<T, K> {
    keys: Vec<K>,
    selector: Selector<T, K>,
    comparer: Comparer<K>,
    direction: SortDirection,
}

impl<T, K: Send> KeyColumn<T> for KeyVec<T, K> {
    fn push(&mut self, item: &T, token: &CancellationToken) -> BoxFuture<'_, Result<()>> {
        let pending = self.selector.evaluate(item, token);
        Box::pin(async move {
            let key = pending.await?;
            self.keys.push(key);
            Ok(())
        })
    }

    fn compare(&self, a: usize, b: usize) -> Result<Ordering> {
        match (self.keys.get(a), self.keys.get(b)) {
            (Some(ka), Some(kb)) => Ok(self.direction.apply(self.comparer.compare(ka, kb)?)),
            _ => Err(Error::fault("sort key index out of range")),
        }
    }
}

/// Shared handle to a sort clause.
pub struct Clause<T> {
    inner: Arc<dyn SortClause<T>>,
}

impl<T: 'static> Clause<T> {
    pub fn new<K>(selector: Selector<T, K>, comparer: Comparer<K>, direction: SortDirection) -> Self
    where
        K: Send + 'static,
    {
        Self {
            inner: Arc::new(KeyedClause {
                selector,
                comparer,
                direction,
            }),
        }
    }

    /// Ascending by a synchronous key with its natural order.
    pub fn ascending<K, F>(key: F) -> Self
    where
        K: Ord + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::new(Selector::sync(key), Comparer::natural(), SortDirection::Ascending)
    }

    /// Descending by a synchronous key with its natural order.
    pub fn descending<K, F>(key: F) -> Self
    where
        K: Ord + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::new(Selector::sync(key), Comparer::natural(), SortDirection::Descending)
    }
}

impl<T> Clause<T> {
    pub fn direction(&self) -> SortDirection {
        self.inner.direction()
    }

    pub(crate) fn column(&self, capacity: usize) -> Box<dyn KeyColumn<T>> {
        self.inner.column(capacity)
    }
}

impl<T> Clone for Clause<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Clause<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clause")
            .field("direction", &self.direction())
            .finish_non_exhaustive()
    }
}
