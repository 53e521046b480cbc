//! Key grouping. Drains the source into a [`Lookup`] on the first advance and
//! yields one [`Grouping`] per distinct key, in first-seen order.

use futures::future::BoxFuture;

use pullseq_core::prelude::*;

use crate::join::{Grouping, Lookup};
use crate::metrics;

pub struct GroupBy<T, K> {
    source: Seq<T>,
    key: Selector<T, K>,
    equality: Equality<K>,
}

impl<T: 'static, K: 'static> GroupBy<T, K> {
    pub fn new(source: Seq<T>, key: Selector<T, K>) -> Self
    where
        K: std::hash::Hash + Eq,
    {
        Self::with_equality(source, key, Equality::standard())
    }

    pub fn with_equality(source: Seq<T>, key: Selector<T, K>, equality: Equality<K>) -> Self {
        Self {
            source,
            key,
            equality,
        }
    }
}

impl<T: Send + 'static, K: Send + 'static> AsyncSequence for GroupBy<T, K> {
    type Item = Grouping<K, T>;

    fn begin(&self, ctx: &Context) -> Iter<Grouping<K, T>> {
        Iter::new(GroupByIter {
            source: self.source.clone(),
            key: self.key.clone(),
            equality: self.equality.clone(),
            ctx: ctx.clone(),
            groups: None,
            current: None,
            state: IterState::NotStarted,
        })
    }
}

struct GroupByIter<T, K> {
    source: Seq<T>,
    key: Selector<T, K>,
    equality: Equality<K>,
    ctx: Context,
    groups: Option<std::vec::IntoIter<Grouping<K, T>>>,
    current: Option<Grouping<K, T>>,
    state: IterState,
}

impl<T: Send + 'static, K: Send + 'static> GroupByIter<T, K> {
    async fn step(&mut self) -> Result<bool> {
        if self.groups.is_none() {
            self.ctx.token().check()?;
            let it = self.source.begin(&self.ctx);
            let lookup = Lookup::build(
                it,
                &self.key,
                self.equality.clone(),
                self.ctx.token(),
                self.ctx.config().initial_capacity(),
            )
            .await?;
            metrics::record_lookup("group_by", lookup.len(), lookup.element_count());
            self.groups = Some(lookup.into_iter());
        }
        self.current = self.groups.as_mut().and_then(Iterator::next);
        Ok(self.current.is_some())
    }
}

impl<T: Send + 'static, K: Send + 'static> AsyncIterator for GroupByIter<T, K> {
    type Item = Grouping<K, T>;

    fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            if !self.state.can_advance() {
                return Ok(false);
            }
            let step = self.step().await;
            self.state.settle(step)
        })
    }

    fn current(&self) -> Option<&Grouping<K, T>> {
        self.current.as_ref()
    }

    fn take_current(&mut self) -> Option<Grouping<K, T>> {
        self.current.take()
    }

    fn dispose(&mut self) -> Result<()> {
        if self.state.begin_dispose() {
            self.groups = None;
            self.current = None;
        }
        Ok(())
    }
}
