use std::cmp::Ordering;

use futures::future::BoxFuture;

use pullseq_core::prelude::*;
use pullseq_core::settle;

use super::clause::{Clause, KeyColumn};
use crate::metrics;

/// A source plus a non-empty list of clauses, most significant first.
///
/// Nothing is sorted until iteration: the first advance drains the whole
/// source, evaluating every clause's key for every element, disposes the
/// source and sorts. Ties on every clause keep source order.
pub struct OrderedSeq<T> {
    source: Seq<T>,
    clauses: Vec<Clause<T>>,
}

impl<T> std::fmt::Debug for OrderedSeq<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderedSeq")
            .field("source", &self.source)
            .field("clauses", &self.clauses)
            .finish()
    }
}

impl<T: Send + 'static> OrderedSeq<T> {
    pub fn new(source: Seq<T>, primary: Clause<T>) -> Self {
        Self {
            source,
            clauses: vec![primary],
        }
    }

    /// Fails synchronously when `clauses` is empty.
    pub fn from_clauses(source: Seq<T>, clauses: Vec<Clause<T>>) -> Result<Self> {
        if clauses.is_empty() {
            return Err(Error::argument("clauses", "an ordering needs at least one clause"));
        }
        Ok(Self { source, clauses })
    }

    /// Append a secondary clause.
    pub fn then(mut self, clause: Clause<T>) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn then_by<K, F>(self, key: F) -> Self
    where
        K: Ord + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.then(Clause::ascending(key))
    }

    pub fn then_by_descending<K, F>(self, key: F) -> Self
    where
        K: Ord + Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.then(Clause::descending(key))
    }

    /// Secondary clause with any selector shape and an explicit comparer.
    pub fn then_by_key<K>(
        self,
        selector: Selector<T, K>,
        comparer: Comparer<K>,
        direction: SortDirection,
    ) -> Self
    where
        K: Send + 'static,
    {
        self.then(Clause::new(selector, comparer, direction))
    }

    pub fn clauses(&self) -> &[Clause<T>] {
        &self.clauses
    }
}

impl<T> Clone for OrderedSeq<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            clauses: self.clauses.clone(),
        }
    }
}

impl<T: Send + 'static> AsyncSequence for OrderedSeq<T> {
    type Item = T;

    fn begin(&self, ctx: &Context) -> Iter<T> {
        Iter::new(OrderedIter {
            source: self.source.clone(),
            clauses: self.clauses.clone(),
            ctx: ctx.clone(),
            sorted: None,
            current: None,
            state: IterState::NotStarted,
        })
    }
}

struct OrderedIter<T> {
    source: Seq<T>,
    clauses: Vec<Clause<T>>,
    ctx: Context,
    sorted: Option<std::vec::IntoIter<T>>,
    current: Option<T>,
    state: IterState,
}

impl<T: Send + 'static> OrderedIter<T> {
    async fn drain_and_sort(&mut self) -> Result<Vec<T>> {
        self.ctx.token().check()?;
        let capacity = self.ctx.config().initial_capacity();
        let mut columns: Vec<Box<dyn KeyColumn<T>>> =
            self.clauses.iter().map(|c| c.column(capacity)).collect();
        let mut buffer = Vec::with_capacity(capacity);

        let mut it = self.source.begin(&self.ctx);
        let outcome = fill(&mut it, &mut buffer, &mut columns, self.ctx.token()).await;
        settle(outcome, it.dispose())?;
        metrics::record_drain("order_by", buffer.len());

        let mut order: Vec<usize> = (0..buffer.len()).collect();
        try_sort_stable(&mut order, |a, b| {
            for column in &columns {
                match column.compare(a, b)? {
                    Ordering::Equal => continue,
                    ord => return Ok(ord),
                }
            }
            Ok(a.cmp(&b))
        })?;
        Ok(permute(buffer, &order))
    }

    async fn step(&mut self) -> Result<bool> {
        if self.sorted.is_none() {
            let sorted = self.drain_and_sort().await?;
            self.sorted = Some(sorted.into_iter());
        }
        self.current = self.sorted.as_mut().and_then(Iterator::next);
        Ok(self.current.is_some())
    }
}

impl<T: Send + 'static> AsyncIterator for OrderedIter<T> {
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
        // The source is disposed as soon as the drain ends.
        if self.state.begin_dispose() {
            self.sorted = None;
            self.current = None;
        }
        Ok(())
    }
}

async fn fill<T: Send>(
    it: &mut Iter<T>,
    buffer: &mut Vec<T>,
    columns: &mut [Box<dyn KeyColumn<T>>],
    token: &CancellationToken,
) -> Result<()> {
    while let Some(item) = it.next().await? {
        for column in columns.iter_mut() {
            let pending = column.push(&item, token);
            pending.await?;
        }
        buffer.push(item);
    }
    Ok(())
}

/// Bottom-up merge sort that stops at the first comparer fault. Stable: on
/// ties the left run wins.
fn try_sort_stable<F>(items: &mut Vec<usize>, mut cmp: F) -> Result<()>
where
    F: FnMut(usize, usize) -> Result<Ordering>,
{
    let len = items.len();
    let mut scratch = Vec::with_capacity(len);
    let mut width = 1;
    while width < len {
        scratch.clear();
        let mut start = 0;
        while start < len {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut i, mut j) = (start, mid);
            while i < mid && j < end {
                if cmp(items[j], items[i])? == Ordering::Less {
                    scratch.push(items[j]);
                    j += 1;
                } else {
                    scratch.push(items[i]);
                    i += 1;
                }
            }
            scratch.extend_from_slice(&items[i..mid]);
            scratch.extend_from_slice(&items[j..end]);
            start = end;
        }
        std::mem::swap(items, &mut scratch);
        width *= 2;
    }
    Ok(())
}

fn permute<T>(buffer: Vec<T>, order: &[usize]) -> Vec<T> {
    let mut slots: Vec<Option<T>> = buffer.into_iter().map(Some).collect();
    order.iter().filter_map(|&i| slots[i].take()).collect()
}
