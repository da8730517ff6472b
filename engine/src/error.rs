//! Error types for the matchsync engine.

use crate::{FixtureId, SurrogateId};
use thiserror::Error;

/// All possible errors from the matchsync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Feed errors
    #[error("invalid feed: {0}")]
    InvalidFeed(String),

    #[error("fixture mismatch: feed carries {feed}, persisted state belongs to {persisted}")]
    FixtureMismatch {
        feed: FixtureId,
        persisted: FixtureId,
    },

    // Persisted state errors
    #[error("duplicate surrogate id: {0}")]
    DuplicateSurrogateId(SurrogateId),

    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),

    // Collaborator errors
    #[error("persistence failure: {0}")]
    Persistence(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
