use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

/// Failures surfaced by the chunker, the store and the service boundaries.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("dimension mismatch against {id}: query has {actual} dimensions, record has {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("generation failed: {0}")]
    GenerationFailed(String),

    #[error("corrupt snapshot: {0}")]
    CorruptState(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptState(msg.into())
    }
}
