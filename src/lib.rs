#![forbid(unsafe_code)]
//! pullseq: lazy, cancellable, pull-based async sequences with ordering,
//! join, union and zip operators.
//!
//! ```
//! use futures::executor::block_on;
//! use pullseq::prelude::*;
//!
//! let ctx = Context::new();
//! let merged = from_iter(vec![1, 2, 3]).union(from_iter(vec![3, 5, 1, 4]));
//! assert_eq!(block_on(merged.to_vec(&ctx)).unwrap(), vec![1, 2, 3, 5, 4]);
//! ```

pub use pullseq_core::{
    settle, settle_all, AsyncIterator, AsyncSequence, CancelCheck, CancellationToken, Comparer, Context,
    Equality, Error, Iter, IterState, KeyEquality, LateErrorPolicy, Result, Selector, Seq,
    SeqConfig, SortDirection,
};
pub use pullseq_operators::fold;
pub use pullseq_operators::{
    empty, from_future, from_iter, from_stream, into_stream, order_by, order_by_descending,
    order_by_key, union, Clause, DisposeTracker, GroupBy, GroupJoin, Grouping, Join, Lookup,
    OrderedSeq, SeqExt, UnionSeq, Zip,
};
#[cfg(feature = "rt")]
pub use pullseq_operators::{subscribe, Observer, Subscription};

pub mod prelude {
    pub use pullseq_core::prelude::*;
    pub use pullseq_operators::{empty, from_future, from_iter, from_stream, SeqExt};
}
