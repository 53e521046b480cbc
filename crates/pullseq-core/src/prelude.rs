//! Convenient re-exports for downstream crates.

pub use crate::cancel::{CancelCheck, CancellationToken};
pub use crate::compare::{Comparer, Equality, SortDirection};
pub use crate::config::SeqConfig;
pub use crate::context::Context;
pub use crate::error::{Error, Result};
pub use crate::iter::{AsyncIterator, Iter, IterState};
pub use crate::selector::Selector;
pub use crate::seq::{AsyncSequence, Seq};
