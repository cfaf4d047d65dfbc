//! Error types for PDU operations.

/// Result type alias for PDU operations.
pub type Result<T> = std::result::Result<T, Error>;

/// PDU error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No recipient survived address validation.
    #[error("No valid recipients")]
    NoRecipients,

    /// Address could not be classified.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Part failed validation.
    #[error("Invalid part: {0}")]
    InvalidPart(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Value does not fit the WSP primitive it was written as.
    #[error("Value out of range for {kind}: {value}")]
    ValueOutOfRange {
        /// Primitive being written (e.g. "short-integer").
        kind: &'static str,
        /// Offending value.
        value: u64,
    },

    /// Input ended in the middle of a value.
    #[error("Truncated PDU at offset {0}")]
    Truncated(usize),

    /// Structurally invalid PDU.
    #[error("Malformed PDU: {0}")]
    Malformed(String),
}
