use thiserror::Error;

/// Fatal problems with the participant data; the run produces no result
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("participant set is empty")]
    EmptyParticipantSet,

    #[error("participant '{0}' has no answers")]
    EmptyAnswers(String),

    #[error("participant '{id}' has {found} answers, expected {expected}")]
    LengthMismatch {
        id: String,
        expected: usize,
        found: usize,
    },

    #[error("participant '{id}' has a non-numeric answer at position {index}")]
    NonFiniteAnswer { id: String, index: usize },

    #[error("participant id '{0}' appears more than once")]
    DuplicateId(String),

    #[error("participant at position {0} has a blank id")]
    BlankId(usize),

    #[error("geometric strategy needs at least {needed} answers, got {found}")]
    TooFewAnswers { needed: usize, found: usize },
}

/// Errors surfaced by the engine entry points
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(err: validator::ValidationErrors) -> Self {
        EngineError::InvalidConfig(err.to_string())
    }
}
