//! Hash join and group join.
//!
//! Both operators share one probe: on the first advance the inner sequence is
//! drained into a [`Lookup`] (and disposed), then the outer sequence is
//! streamed and each outer key is probed against it. An inner-key fault
//! therefore surfaces on the first advance, before any outer element is seen;
//! an outer-key fault surfaces on the advance that reaches that element.

mod group;
mod lookup;

use std::sync::Arc;

use futures::future::BoxFuture;

use pullseq_core::prelude::*;

use crate::metrics;

pub use group::GroupJoin;
pub use lookup::{Grouping, Lookup};

/// Everything needed to run one probe, shared by every iteration.
struct JoinSources<O, I, K> {
    outer: Seq<O>,
    inner: Seq<I>,
    outer_key: Selector<O, K>,
    inner_key: Selector<I, K>,
    equality: Equality<K>,
}

impl<O, I, K> Clone for JoinSources<O, I, K> {
    fn clone(&self) -> Self {
        Self {
            outer: self.outer.clone(),
            inner: self.inner.clone(),
            outer_key: self.outer_key.clone(),
            inner_key: self.inner_key.clone(),
            equality: self.equality.clone(),
        }
    }
}

/// Per-iteration probe state.
struct Probe<O, I, K> {
    sources: JoinSources<O, I, K>,
    ctx: Context,
    outer: Option<Iter<O>>,
    lookup: Option<Lookup<K, I>>,
}

impl<O, I, K> Probe<O, I, K>
where
    O: Send + 'static,
    I: Send + 'static,
    K: Send + 'static,
{
    fn new(sources: JoinSources<O, I, K>, ctx: &Context) -> Self {
        Self {
            sources,
            ctx: ctx.clone(),
            outer: None,
            lookup: None,
        }
    }

    async fn build(&mut self) -> Result<()> {
        self.ctx.token().check()?;
        let inner = self.sources.inner.begin(&self.ctx);
        let lookup = Lookup::build(
            inner,
            &self.sources.inner_key,
            self.sources.equality.clone(),
            self.ctx.token(),
            self.ctx.config().initial_capacity(),
        )
        .await?;
        metrics::record_lookup("join", lookup.len(), lookup.element_count());
        self.lookup = Some(lookup);
        self.outer = Some(self.sources.outer.begin(&self.ctx));
        Ok(())
    }

    /// Next outer element and the index of its matching group, if any.
    async fn next_outer(&mut self) -> Result<Option<(O, Option<usize>)>> {
        if self.lookup.is_none() {
            self.build().await?;
        }
        let Some(outer) = self.outer.as_mut() else {
            return Ok(None);
        };
        let Some(item) = outer.next().await? else {
            return Ok(None);
        };
        let pending = self.sources.outer_key.evaluate(&item, self.ctx.token());
        let key = pending.await?;
        let group = self.lookup.as_ref().and_then(|lookup| lookup.find(&key));
        Ok(Some((item, group)))
    }

    /// Elements of a group found by `next_outer`; empty for no match.
    fn group(&self, index: Option<usize>) -> &[I] {
        match (self.lookup.as_ref(), index) {
            (Some(lookup), Some(i)) => lookup
                .get(i)
                .map(|g| g.elements.as_slice())
                .unwrap_or_default(),
            _ => &[],
        }
    }

    fn dispose(&mut self) -> Result<()> {
        self.lookup = None;
        match self.outer.take() {
            Some(mut outer) => outer.dispose(),
            None => Ok(()),
        }
    }
}

type JoinFn<O, I, R> = dyn Fn(&O, &I) -> Result<R> + Send + Sync;

/// Inner join: one result per (outer, matching inner) pair, in outer order,
/// then inner source order within each outer element.
pub struct Join<O, I, K, R> {
    sources: JoinSources<O, I, K>,
    result: Arc<JoinFn<O, I, R>>,
}

impl<O, I, K, R> Join<O, I, K, R>
where
    O: 'static,
    I: 'static,
    K: 'static,
    R: 'static,
{
    pub fn new<F>(
        outer: Seq<O>,
        inner: Seq<I>,
        outer_key: Selector<O, K>,
        inner_key: Selector<I, K>,
        result: F,
    ) -> Self
    where
        K: std::hash::Hash + Eq,
        F: Fn(&O, &I) -> Result<R> + Send + Sync + 'static,
    {
        Self::with_equality(outer, inner, outer_key, inner_key, result, Equality::standard())
    }

    pub fn with_equality<F>(
        outer: Seq<O>,
        inner: Seq<I>,
        outer_key: Selector<O, K>,
        inner_key: Selector<I, K>,
        result: F,
        equality: Equality<K>,
    ) -> Self
    where
        F: Fn(&O, &I) -> Result<R> + Send + Sync + 'static,
    {
        Self {
            sources: JoinSources {
                outer,
                inner,
                outer_key,
                inner_key,
                equality,
            },
            result: Arc::new(result),
        }
    }
}

impl<O, I, K, R> AsyncSequence for Join<O, I, K, R>
where
    O: Send + 'static,
    I: Send + 'static,
    K: Send + 'static,
    R: Send + 'static,
{
    type Item = R;

    fn begin(&self, ctx: &Context) -> Iter<R> {
        Iter::new(JoinIter {
            probe: Probe::new(self.sources.clone(), ctx),
            result: Arc::clone(&self.result),
            pending: None,
            current: None,
            state: IterState::NotStarted,
        })
    }
}

/// An outer element still emitting matches.
struct Pending<O> {
    outer: O,
    group: usize,
    pos: usize,
}

struct JoinIter<O, I, K, R> {
    probe: Probe<O, I, K>,
    result: Arc<JoinFn<O, I, R>>,
    pending: Option<Pending<O>>,
    current: Option<R>,
    state: IterState,
}

impl<O, I, K, R> JoinIter<O, I, K, R>
where
    O: Send + 'static,
    I: Send + 'static,
    K: Send + 'static,
    R: Send,
{
    async fn step(&mut self) -> Result<bool> {
        self.current = None;
        loop {
            if let Some(p) = self.pending.as_mut() {
                if let Some(inner) = self.probe.group(Some(p.group)).get(p.pos) {
                    p.pos += 1;
                    self.current = Some((self.result)(&p.outer, inner)?);
                    return Ok(true);
                }
                self.pending = None;
            }
            let Some((outer, group)) = self.probe.next_outer().await? else {
                return Ok(false);
            };
            // Outer elements without a match contribute nothing.
            if let Some(group) = group {
                self.pending = Some(Pending {
                    outer,
                    group,
                    pos: 0,
                });
            }
        }
    }
}

impl<O, I, K, R> AsyncIterator for JoinIter<O, I, K, R>
where
    O: Send + 'static,
    I: Send + 'static,
    K: Send + 'static,
    R: Send,
{
    type Item = R;

    fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            if !self.state.can_advance() {
                return Ok(false);
            }
            let step = self.step().await;
            self.state.settle(step)
        })
    }

    fn current(&self) -> Option<&R> {
        self.current.as_ref()
    }

    fn take_current(&mut self) -> Option<R> {
        self.current.take()
    }

    fn dispose(&mut self) -> Result<()> {
        if !self.state.begin_dispose() {
            return Ok(());
        }
        self.current = None;
        self.pending = None;
        self.probe.dispose()
    }
}
