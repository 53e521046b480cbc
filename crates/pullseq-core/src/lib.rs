#![forbid(unsafe_code)]
//! pullseq-core: the lazy pull/cancel/dispose protocol shared by every operator.
//!
//! Design intent:
//! - Sequences are immutable descriptions; iterators own all per-iteration state.
//! - No runtime here. Operators suspend only where user code or a source does.
//! - Key selectors are one capability (`evaluate`) behind three closure shapes,
//!   so the sort/join/union algorithms exist exactly once.

pub mod cancel;
pub mod compare;
pub mod config;
pub mod context;
pub mod error;
pub mod iter;
pub mod prelude;
pub mod selector;
pub mod seq;

pub use cancel::{CancelCheck, CancellationToken};
pub use compare::{Comparer, Equality, KeyEquality, SortDirection};
pub use config::{LateErrorPolicy, SeqConfig, MAX_PREALLOCATION};
pub use context::Context;
pub use error::{settle, settle_all, Error, Result};
pub use iter::{AsyncIterator, Iter, IterState};
pub use selector::{KeyFuture, KeySelect, Selector};
pub use seq::{AsyncSequence, Seq};
