use thiserror::Error;

/// Canonical result for pullseq.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Raised synchronously at composition time, before any iteration starts.
    #[error("invalid argument `{name}`: {reason}")]
    Argument { name: &'static str, reason: String },

    #[error("iteration was cancelled")]
    Cancelled,

    /// A fault raised by user code (selector, comparer, source).
    #[error("{0}")]
    Fault(String),

    #[error(transparent)]
    External(Box<dyn std::error::Error + Send + Sync>),

    /// Several disposal stages faulted; none is dropped.
    #[error("{} faults during iteration teardown: {}", .0.len(), join_messages(.0))]
    Aggregate(Vec<Error>),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn argument(name: &'static str, reason: impl Into<String>) -> Self {
        Error::Argument {
            name,
            reason: reason.into(),
        }
    }

    pub fn fault(msg: impl Into<String>) -> Self {
        Error::Fault(msg.into())
    }

    pub fn external<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::External(Box::new(err))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    pub fn is_argument(&self) -> bool {
        matches!(self, Error::Argument { .. })
    }

    /// Build one error out of several, flattening nested aggregates.
    /// A single error is returned as-is.
    pub fn aggregate(errors: impl IntoIterator<Item = Error>) -> Option<Error> {
        let mut flat = Vec::new();
        for err in errors {
            match err {
                Error::Aggregate(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Error::Aggregate(flat)),
        }
    }
}

fn join_messages(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Combine the outcome of an operation with the outcome of disposing the
/// iterator it ran on. Both faults are kept when both stages fail.
pub fn settle<R>(outcome: Result<R>, disposal: Result<()>) -> Result<R> {
    match (outcome, disposal) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) | (Err(err), Ok(())) => Err(err),
        (Err(first), Err(second)) => Err(first.and(second)),
    }
}

impl Error {
    /// Keep `self` and `other` together as one aggregate fault.
    pub fn and(self, other: Error) -> Error {
        let mut flat = Vec::new();
        for err in [self, other] {
            match err {
                Error::Aggregate(inner) => flat.extend(inner),
                err => flat.push(err),
            }
        }
        Error::Aggregate(flat)
    }
}

/// Combine several disposal outcomes, in the order they ran.
pub fn settle_all(outcomes: impl IntoIterator<Item = Result<()>>) -> Result<()> {
    match Error::aggregate(outcomes.into_iter().filter_map(|r| r.err())) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
