//! Per-iteration context handed to `begin`.

use std::sync::Arc;

use crate::cancel::CancellationToken;
use crate::config::SeqConfig;

/// Carries the cancellation token and configuration for one iteration.
/// Operators pass the same context to every upstream `begin`.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    config: Arc<SeqConfig>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn with_config(mut self, config: SeqConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn config(&self) -> &SeqConfig {
        &self.config
    }
}
