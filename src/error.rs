use thiserror::Error;

/// Main error type for index build and query operations
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corpus source error: {0}")]
    Corpus(#[from] sqlx::Error),

    #[error("Corrupt index data: {0}")]
    Corrupt(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Corpus exceeds the maximum of {} documents", u32::MAX)]
    TooManyDocuments,
}

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        IndexError::Corrupt(msg.into())
    }

    /// Check if this error comes from malformed artifact or run data rather
    /// than from the environment
    pub fn is_corruption(&self) -> bool {
        match self {
            IndexError::Corrupt(_) | IndexError::Json(_) => true,
            IndexError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}
