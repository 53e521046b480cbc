//! Multi-key stable ordering (order_by / then_by and descending variants).

mod clause;
mod ordered;

pub use clause::Clause;
pub use ordered::OrderedSeq;

use pullseq_core::prelude::*;

/// Ascending by a synchronous key with its natural order.
pub fn order_by<T, K, F>(source: Seq<T>, key: F) -> OrderedSeq<T>
where
    T: Send + 'static,
    K: Ord + Send + 'static,
    F: Fn(&T) -> K + Send + Sync + 'static,
{
    OrderedSeq::new(source, Clause::ascending(key))
}

/// Descending by a synchronous key with its natural order.
pub fn order_by_descending<T, K, F>(source: Seq<T>, key: F) -> OrderedSeq<T>
where
    T: Send + 'static,
    K: Ord + Send + 'static,
    F: Fn(&T) -> K + Send + Sync + 'static,
{
    OrderedSeq::new(source, Clause::descending(key))
}

/// Primary clause with any selector shape and an explicit comparer.
pub fn order_by_key<T, K>(
    source: Seq<T>,
    selector: Selector<T, K>,
    comparer: Comparer<K>,
    direction: SortDirection,
) -> OrderedSeq<T>
where
    T: Send + 'static,
    K: Send + 'static,
{
    OrderedSeq::new(source, Clause::new(selector, comparer, direction))
}
