//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur while submitting a message.
#[derive(Debug, Error)]
pub enum Error {
    /// No recipient survived address validation.
    #[error("No valid recipients")]
    InvalidRecipients,

    /// The message header or body could not be encoded.
    #[error("Encoding failed: {0}")]
    EncodingFailure(courier_pdu::Error),

    /// A part could not be built and the failure policy is strict.
    #[error("Part {name} rejected: {reason}")]
    PartRejected {
        /// Part name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The MMS gateway is not configured or cannot be reached.
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// The transport or network collaborator failed the hand-off.
    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    /// Persistence failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Text segmentation failed.
    #[error("SMS error: {0}")]
    Sms(#[from] courier_sms::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<courier_pdu::Error> for Error {
    fn from(e: courier_pdu::Error) -> Self {
        match e {
            courier_pdu::Error::NoRecipients => Self::InvalidRecipients,
            other => Self::EncodingFailure(other),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
