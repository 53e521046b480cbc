use std::hash::Hash;

use futures::future::BoxFuture;

use pullseq_core::prelude::*;

use crate::basic::{Filter, Select, Window};
use crate::fold;
use crate::group_by::GroupBy;
use crate::join::{GroupJoin, Join};
use crate::sort::{Clause, OrderedSeq};
use crate::union::UnionSeq;
use crate::zip::Zip;

///
/// SeqExt
/// Fluent composition for every sequence. Each method only builds a new
/// sequence; nothing runs until an iteration begins.
///
pub trait SeqExt: AsyncSequence + Sized + 'static {
    // --- pass-through ---

    fn select<R, F>(self, f: F) -> Select<Self::Item, R>
    where
        Self::Item: Send + 'static,
        R: 'static,
        F: Fn(&Self::Item) -> R + Send + Sync + 'static,
    {
        Select::new(self.into_seq(), f)
    }

    fn filter<F>(self, predicate: F) -> Filter<Self::Item>
    where
        Self::Item: Send + 'static,
        F: Fn(&Self::Item) -> bool + Send + Sync + 'static,
    {
        Filter::new(self.into_seq(), predicate)
    }

    fn take(self, count: usize) -> Window<Self::Item>
    where
        Self::Item: Send + 'static,
    {
        Window::take(self.into_seq(), count)
    }

    fn skip(self, count: usize) -> Window<Self::Item>
    where
        Self::Item: Send + 'static,
    {
        Window::skip(self.into_seq(), count)
    }

    // --- combination ---

    fn zip<B, R, F>(self, second: B, result: F) -> Zip<Self::Item, B::Item, R>
    where
        B: AsyncSequence + 'static,
        Self::Item: Send + 'static,
        B::Item: Send + 'static,
        R: 'static,
        F: Fn(&Self::Item, &B::Item) -> Result<R> + Send + Sync + 'static,
    {
        Zip::new(self.into_seq(), second.into_seq(), result)
    }

    fn union<B>(self, second: B) -> UnionSeq<Self::Item>
    where
        B: AsyncSequence<Item = Self::Item> + 'static,
        Self::Item: Clone + Hash + Eq + Send + 'static,
    {
        crate::union::union(self, second)
    }

    fn union_with<B>(self, second: B, equality: Equality<Self::Item>) -> UnionSeq<Self::Item>
    where
        B: AsyncSequence<Item = Self::Item> + 'static,
        Self::Item: Clone + Send + 'static,
    {
        UnionSeq::pair(self.into_seq(), second.into_seq(), equality)
    }

    // --- joins ---

    fn join<I, K, R, F>(
        self,
        inner: I,
        outer_key: Selector<Self::Item, K>,
        inner_key: Selector<I::Item, K>,
        result: F,
    ) -> Join<Self::Item, I::Item, K, R>
    where
        I: AsyncSequence + 'static,
        Self::Item: 'static,
        I::Item: 'static,
        K: Hash + Eq + 'static,
        R: 'static,
        F: Fn(&Self::Item, &I::Item) -> Result<R> + Send + Sync + 'static,
    {
        Join::new(self.into_seq(), inner.into_seq(), outer_key, inner_key, result)
    }

    fn join_with<I, K, R, F>(
        self,
        inner: I,
        outer_key: Selector<Self::Item, K>,
        inner_key: Selector<I::Item, K>,
        result: F,
        equality: Equality<K>,
    ) -> Join<Self::Item, I::Item, K, R>
    where
        I: AsyncSequence + 'static,
        Self::Item: 'static,
        I::Item: 'static,
        K: 'static,
        R: 'static,
        F: Fn(&Self::Item, &I::Item) -> Result<R> + Send + Sync + 'static,
    {
        Join::with_equality(
            self.into_seq(),
            inner.into_seq(),
            outer_key,
            inner_key,
            result,
            equality,
        )
    }

    fn group_join<I, K, R, F>(
        self,
        inner: I,
        outer_key: Selector<Self::Item, K>,
        inner_key: Selector<I::Item, K>,
        result: F,
    ) -> GroupJoin<Self::Item, I::Item, K, R>
    where
        I: AsyncSequence + 'static,
        Self::Item: 'static,
        I::Item: 'static,
        K: Hash + Eq + 'static,
        R: 'static,
        F: Fn(&Self::Item, &[I::Item]) -> Result<R> + Send + Sync + 'static,
    {
        GroupJoin::new(self.into_seq(), inner.into_seq(), outer_key, inner_key, result)
    }

    fn group_join_with<I, K, R, F>(
        self,
        inner: I,
        outer_key: Selector<Self::Item, K>,
        inner_key: Selector<I::Item, K>,
        result: F,
        equality: Equality<K>,
    ) -> GroupJoin<Self::Item, I::Item, K, R>
    where
        I: AsyncSequence + 'static,
        Self::Item: 'static,
        I::Item: 'static,
        K: 'static,
        R: 'static,
        F: Fn(&Self::Item, &[I::Item]) -> Result<R> + Send + Sync + 'static,
    {
        GroupJoin::with_equality(
            self.into_seq(),
            inner.into_seq(),
            outer_key,
            inner_key,
            result,
            equality,
        )
    }

    // --- ordering & grouping ---

    fn order_by<K, F>(self, key: F) -> OrderedSeq<Self::Item>
    where
        Self::Item: Send + 'static,
        K: Ord + Send + 'static,
        F: Fn(&Self::Item) -> K + Send + Sync + 'static,
    {
        OrderedSeq::new(self.into_seq(), Clause::ascending(key))
    }

    fn order_by_descending<K, F>(self, key: F) -> OrderedSeq<Self::Item>
    where
        Self::Item: Send + 'static,
        K: Ord + Send + 'static,
        F: Fn(&Self::Item) -> K + Send + Sync + 'static,
    {
        OrderedSeq::new(self.into_seq(), Clause::descending(key))
    }

    fn order_by_key<K>(
        self,
        selector: Selector<Self::Item, K>,
        comparer: Comparer<K>,
        direction: SortDirection,
    ) -> OrderedSeq<Self::Item>
    where
        Self::Item: Send + 'static,
        K: Send + 'static,
    {
        OrderedSeq::new(self.into_seq(), Clause::new(selector, comparer, direction))
    }

    fn group_by<K>(self, key: Selector<Self::Item, K>) -> GroupBy<Self::Item, K>
    where
        Self::Item: 'static,
        K: Hash + Eq + 'static,
    {
        GroupBy::new(self.into_seq(), key)
    }

    fn group_by_with<K>(
        self,
        key: Selector<Self::Item, K>,
        equality: Equality<K>,
    ) -> GroupBy<Self::Item, K>
    where
        Self::Item: 'static,
        K: 'static,
    {
        GroupBy::with_equality(self.into_seq(), key, equality)
    }

    // --- terminal ---

    fn to_vec<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<Vec<Self::Item>>>
    where
        Self::Item: Send,
    {
        Box::pin(fold::to_vec(self, ctx))
    }

    fn count<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<usize>>
    where
        Self::Item: Send,
    {
        Box::pin(fold::count(self, ctx))
    }
}

impl<S: AsyncSequence + 'static> SeqExt for S {}
