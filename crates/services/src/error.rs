//! Shared error types for the services crate.

use std::fmt;

use thiserror::Error;

use quiz_core::model::{QuizError, RequestError};
use storage::StorageError;

use crate::sessions::SessionState;

/// Errors emitted by `QuizSession`.
///
/// `NotInProgress`, `NotStarted` and `NotCompleted` report an intent that does
/// not apply in the current state; callers may ignore them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    InvalidQuiz(#[from] QuizError),
    #[error("session is not in progress (state: {state:?})")]
    NotInProgress { state: SessionState },
    #[error("session has not been started")]
    NotStarted,
    #[error("session was already started (state: {state:?})")]
    AlreadyStarted { state: SessionState },
    #[error("session is not completed")]
    NotCompleted,
    #[error("question {index} is out of range for a quiz of {len} questions")]
    QuestionOutOfRange { index: usize, len: usize },
    #[error("{option:?} is not an option of question {index}")]
    UnknownOption { index: usize, option: String },
}

/// Failure inside one persistence step.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Which durable record a persistence step was updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceTarget {
    History,
    Stats,
    Leaderboard,
}

impl fmt::Display for PersistenceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::History => f.write_str("quiz history"),
            Self::Stats => f.write_str("statistics"),
            Self::Leaderboard => f.write_str("leaderboard"),
        }
    }
}

/// Non-fatal report that a completed result was not fully persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceWarning {
    pub target: PersistenceTarget,
    pub message: String,
}

impl PersistenceWarning {
    #[must_use]
    pub fn new(target: PersistenceTarget, error: &PersistenceError) -> Self {
        Self {
            target,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not save {}: {}", self.target, self.message)
    }
}

/// Errors emitted by the quiz generation backend client.
///
/// Messages are meant to be shown to the user as-is.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(
        "Network error: unable to connect to the server at {base_url}. Please make sure the backend server is running."
    )]
    Unreachable { base_url: String },
    #[error("{message}")]
    Rejected { status: Option<u16>, message: String },
    #[error("Invalid response from server")]
    InvalidResponse,
    #[error("Invalid JSON response from server")]
    InvalidJson,
    #[error("server returned an invalid quiz: {0}")]
    InvalidQuiz(#[from] QuizError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
