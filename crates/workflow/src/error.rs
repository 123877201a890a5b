use domain::TransitionError;
use storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Review {0} not found")]
    RecordNotFound(i64),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("{0}")]
    PreconditionFailed(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Failures talking to the external review source. Everything here is a
/// page-level hard error; the caller decides whether to retry the offset.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Review source unreachable: {0}")]
    Transport(String),

    #[error("Unexpected response from review source: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::Transport(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("No responder API key configured")]
    MissingCredential,

    #[error("Responder unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected responder reply: {0}")]
    Protocol(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
