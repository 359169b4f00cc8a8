use basket_rec_core::CoreError;
use std::fmt;

pub type Result<T> = std::result::Result<T, RecommenderError>;

/// Which identifier space a failed lookup was made in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    User,
    Item,
    UserIndex,
    ItemIndex,
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdKind::User => "user",
            IdKind::Item => "item",
            IdKind::UserIndex => "user index",
            IdKind::ItemIndex => "item index",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecommenderError {
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Unknown {kind}: {key}")]
    KeyNotFound { kind: IdKind, key: String },

    #[error("Expected {expected} recommendations, got {actual}")]
    RecommendationCount { expected: usize, actual: usize },

    #[error("Requested {requested} items but only {available} candidates are available")]
    InsufficientCandidates { requested: usize, available: usize },

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Config(#[from] CoreError),
}

impl RecommenderError {
    pub(crate) fn key_not_found(kind: IdKind, key: impl fmt::Display) -> Self {
        RecommenderError::KeyNotFound {
            kind,
            key: key.to_string(),
        }
    }
}
