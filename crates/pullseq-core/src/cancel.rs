//! Cooperative cancellation.
//!
//! A token is handed to `begin` through the iteration [`Context`] and flows
//! to every upstream iterator and every cancellation-aware selector. Nothing
//! is interrupted preemptively: operators check the token before each major
//! unit of work and report [`Error::Cancelled`]. Selectors that suspend can
//! race their work against `token.cancelled()` instead of polling.
//!
//! [`Context`]: crate::context::Context

pub use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Maps a token's state onto the crate's error type.
pub trait CancelCheck {
    /// `Err(Error::Cancelled)` once cancellation was requested.
    fn check(&self) -> Result<()>;
}

impl CancelCheck for CancellationToken {
    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
