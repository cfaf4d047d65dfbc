//! Error types for SMS text operations.

/// Result type alias for SMS text operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMS text error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Chunk size must be at least one code unit.
    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(usize),

    /// Platform result code outside the known vocabulary.
    #[error("Unknown transport result code: {0}")]
    UnknownResultCode(i32),
}
