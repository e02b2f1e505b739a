use thiserror::Error;

/// Failure taxonomy shared by every ragdb crate.
///
/// Variants carry rendered messages rather than sources so the embedding
/// pipeline can hand the same error to its retry callback and still return it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Split failed: {0}")]
    Split(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Store failed: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
