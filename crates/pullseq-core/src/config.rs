//! Iteration configuration that downstream crates can serialize/deserialize.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// What a push subscription does with a fault it observes after the
/// subscriber already unsubscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LateErrorPolicy {
    /// Drop the fault silently.
    Ignore,
    /// Emit it as a `warn` event.
    #[default]
    Log,
    /// Deliver it to the observer's `on_error` regardless.
    Forward,
}

impl FromStr for LateErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(LateErrorPolicy::Ignore),
            "log" => Ok(LateErrorPolicy::Log),
            "forward" => Ok(LateErrorPolicy::Forward),
            other => Err(Error::Config(format!("unknown late error policy '{}'", other))),
        }
    }
}

impl fmt::Display for LateErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LateErrorPolicy::Ignore => "ignore",
            LateErrorPolicy::Log => "log",
            LateErrorPolicy::Forward => "forward",
        };
        f.write_str(name)
    }
}

/// Upper bound on what a single buffer reserves up front.
pub const MAX_PREALLOCATION: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeqConfig {
    /// Initial capacity for sort buffers, lookups and seen-sets. Only a hint;
    /// buffers grow as needed and never reserve more than
    /// [`MAX_PREALLOCATION`] before the first element arrives.
    pub buffer_capacity: usize,

    /// Handling of faults observed after unsubscription.
    pub late_error_policy: LateErrorPolicy,
}

impl Default for SeqConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 16,
            late_error_policy: LateErrorPolicy::Log,
        }
    }
}

impl SeqConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `PULLSEQ_BUFFER_CAPACITY`: initial buffer capacity
    /// - `PULLSEQ_LATE_ERROR_POLICY`: `ignore`, `log` or `forward`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("PULLSEQ_BUFFER_CAPACITY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.buffer_capacity = v;
            }
        }

        if let Ok(s) = std::env::var("PULLSEQ_LATE_ERROR_POLICY") {
            if let Ok(v) = s.parse::<LateErrorPolicy>() {
                cfg.late_error_policy = v;
            }
        }

        cfg
    }

    /// The capacity operators actually reserve: `buffer_capacity` clamped to
    /// [`MAX_PREALLOCATION`].
    pub fn initial_capacity(&self) -> usize {
        self.buffer_capacity.min(MAX_PREALLOCATION)
    }
}
