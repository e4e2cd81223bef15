use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Card not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

/// Coarse classification used by transports to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something unusable. Not retried.
    Validation,
    /// The card id does not exist.
    NotFound,
    /// The storage backend failed.
    Internal,
}

impl CardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CardError::Validation(_) | CardError::InvalidInput(_) => ErrorKind::Validation,
            CardError::NotFound(_) => ErrorKind::NotFound,
            CardError::Io(_) | CardError::Serialization(_) | CardError::Store(_) => {
                ErrorKind::Internal
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CardError>;
