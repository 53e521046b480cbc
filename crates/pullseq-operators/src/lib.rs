#![forbid(unsafe_code)]
//! pullseq-operators: lazy operators over `pullseq-core` sequences.
//!
//! Design intent:
//! - Composition only builds sequences; every buffer, lookup and seen-set is
//!   owned by one iteration and released when that iteration is disposed.
//! - Buffering operators (ordering, join, group-by) drain their source on the
//!   first advance and dispose it before producing anything.
//! - No operator spawns work. The `rt` feature adds a push bridge that runs
//!   one iteration on a tokio task.

pub mod basic;
pub mod bridge;
pub mod ext;
pub mod fold;
pub mod group_by;
pub mod join;
pub mod metrics;
pub mod sort;
pub mod source;
pub mod tracking;
pub mod union;
pub mod zip;

pub use basic::{Filter, Select, Window};
pub use bridge::into_stream;
#[cfg(feature = "rt")]
pub use bridge::{subscribe, Observer, Subscription};
pub use ext::SeqExt;
pub use group_by::GroupBy;
pub use join::{GroupJoin, Grouping, Join, Lookup};
pub use sort::{order_by, order_by_descending, order_by_key, Clause, OrderedSeq};
pub use source::{empty, from_future, from_iter, from_stream};
pub use tracking::DisposeTracker;
pub use union::{union, UnionSeq};
pub use zip::Zip;
