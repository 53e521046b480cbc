//! Streaming set union over any number of sources.
//!
//! `a.union(b)` returns a [`UnionSeq`]; calling `.union(c)` on it appends `c`
//! to the same source list instead of wrapping, so a chain of unions runs as
//! one pass over one seen-set. Sources are consumed strictly in order and each
//! source's iterator is disposed as soon as it is exhausted, before the next
//! source is started.

use std::collections::HashMap;
use std::hash::Hash;

use futures::future::BoxFuture;

use pullseq_core::prelude::*;

use crate::metrics;

#[derive(Clone)]
pub struct UnionSeq<T> {
    sources: Vec<Seq<T>>,
    equality: Equality<T>,
}

impl<T> std::fmt::Debug for UnionSeq<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionSeq")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

impl<T> UnionSeq<T>
where
    T: Clone + Send + 'static,
{
    /// Union of `sources` in order. Fails synchronously when `sources` is
    /// empty.
    pub fn from_sources(sources: Vec<Seq<T>>, equality: Equality<T>) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::argument("sources", "a union needs at least one source"));
        }
        Ok(Self { sources, equality })
    }

    pub(crate) fn pair(first: Seq<T>, second: Seq<T>, equality: Equality<T>) -> Self {
        Self {
            sources: vec![first, second],
            equality,
        }
    }

    /// Append `other` to this union, sharing the existing seen-set.
    pub fn union<S>(mut self, other: S) -> Self
    where
        S: AsyncSequence<Item = T> + 'static,
    {
        self.sources.push(other.into_seq());
        self
    }

    /// Union with a different key equality. The equality cannot be shared with
    /// the existing chain, so the current union becomes the first source.
    pub fn union_with<S>(self, other: S, equality: Equality<T>) -> Self
    where
        S: AsyncSequence<Item = T> + 'static,
    {
        Self::pair(self.into_seq(), other.into_seq(), equality)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl<T: Clone + Send + 'static> AsyncSequence for UnionSeq<T> {
    type Item = T;

    fn begin(&self, ctx: &Context) -> Iter<T> {
        Iter::new(UnionIter {
            sources: self.sources.clone(),
            next_source: 0,
            active: None,
            seen: SeenSet::new(self.equality.clone(), ctx.config().initial_capacity()),
            ctx: ctx.clone(),
            current: None,
            state: IterState::NotStarted,
        })
    }
}

/// Distinct elements under an [`Equality`]. Stores clones of inserted items.
struct SeenSet<T> {
    buckets: HashMap<u64, Vec<T>>,
    equality: Equality<T>,
}

impl<T: Clone> SeenSet<T> {
    fn new(equality: Equality<T>, capacity: usize) -> Self {
        Self {
            buckets: HashMap::with_capacity(capacity),
            equality,
        }
    }

    /// True when `item` was not present before.
    fn insert(&mut self, item: &T) -> bool {
        let hash = self.equality.hash_key(item);
        let bucket = self.buckets.entry(hash).or_default();
        if bucket.iter().any(|seen| self.equality.eq_keys(seen, item)) {
            return false;
        }
        bucket.push(item.clone());
        true
    }
}

struct UnionIter<T> {
    sources: Vec<Seq<T>>,
    next_source: usize,
    active: Option<Iter<T>>,
    seen: SeenSet<T>,
    ctx: Context,
    current: Option<T>,
    state: IterState,
}

impl<T: Clone + Send + 'static> UnionIter<T> {
    async fn step(&mut self) -> Result<bool> {
        self.current = None;
        loop {
            if self.active.is_none() {
                let Some(source) = self.sources.get(self.next_source) else {
                    return Ok(false);
                };
                self.ctx.token().check()?;
                metrics::record_source_switch("union", self.next_source);
                self.active = Some(source.begin(&self.ctx));
                self.next_source += 1;
            }
            let Some(active) = self.active.as_mut() else {
                return Ok(false);
            };

            match active.next().await? {
                Some(item) => {
                    if self.seen.insert(&item) {
                        self.current = Some(item);
                        return Ok(true);
                    }
                }
                None => {
                    // Release this source before the next one is started.
                    if let Some(mut done) = self.active.take() {
                        done.dispose()?;
                    }
                }
            }
        }
    }
}

impl<T: Clone + Send + 'static> AsyncIterator for UnionIter<T> {
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
        if !self.state.begin_dispose() {
            return Ok(());
        }
        self.current = None;
        // Sources never started were never allocated.
        match self.active.take() {
            Some(mut active) => active.dispose(),
            None => Ok(()),
        }
    }
}

/// Standard-equality union of two sequences.
pub fn union<A, B>(first: A, second: B) -> UnionSeq<A::Item>
where
    A: AsyncSequence + 'static,
    B: AsyncSequence<Item = A::Item> + 'static,
    A::Item: Clone + Hash + Eq + Send + 'static,
{
    UnionSeq::pair(first.into_seq(), second.into_seq(), Equality::standard())
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::fold::to_vec;
    use crate::source::{empty, from_iter};

    #[test]
    fn first_occurrence_order() {
        let u = union(from_iter(vec![1, 2, 3]), from_iter(vec![3, 5, 1, 4]));
        assert_eq!(block_on(to_vec(&u, &Context::new())).unwrap(), vec![1, 2, 3, 5, 4]);
    }

    #[test]
    fn chained_unions_flatten() {
        let u = union(from_iter(vec![1, 2]), from_iter(vec![2, 3]))
            .union(from_iter(vec![3, 4]))
            .union(empty());
        assert_eq!(u.source_count(), 4);
        assert_eq!(block_on(to_vec(&u, &Context::new())).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn union_with_projection_dedups_case_insensitively() {
        let words = |v: &[&str]| from_iter(v.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        let u = UnionSeq::from_sources(
            vec![words(&["Apple", "pear"]), words(&["APPLE", "Fig"])],
            Equality::by(|s: &String| s.to_lowercase()),
        )
        .unwrap();
        assert_eq!(
            block_on(to_vec(&u, &Context::new())).unwrap(),
            vec!["Apple".to_string(), "pear".to_string(), "Fig".to_string()]
        );
    }

    #[test]
    fn empty_source_list_is_an_argument_fault() {
        let err = UnionSeq::<i32>::from_sources(vec![], Equality::standard()).unwrap_err();
        assert!(err.is_argument());
    }
}
