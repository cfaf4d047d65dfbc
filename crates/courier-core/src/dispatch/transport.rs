//! SMS transport seam.

use crate::Result;
use crate::store::StoreLocation;

/// Token handed to the transport and returned with a send or delivery signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptToken {
    /// Signal action name (see [`SignalActions`](crate::SignalActions)).
    pub action: String,
    /// Record the signal is about.
    pub record: StoreLocation,
}

impl ReceiptToken {
    /// Creates a token.
    #[must_use]
    pub fn new(action: impl Into<String>, record: StoreLocation) -> Self {
        Self {
            action: action.into(),
            record,
        }
    }
}

/// Receipts requested for every segment of one send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Receipts {
    /// Token for send signals.
    pub sent: Option<ReceiptToken>,
    /// Token for delivery signals.
    pub delivered: Option<ReceiptToken>,
}

impl Receipts {
    /// No receipts.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            sent: None,
            delivered: None,
        }
    }
}

/// One segment handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHandle {
    /// Recipient.
    pub address: String,
    /// Position within the send, 0-based.
    pub index: usize,
    /// Record the segment's signals will update.
    pub record: Option<StoreLocation>,
}

/// Platform SMS transport.
///
/// Sending only hands segments over; outcomes come back later as
/// [`TransportSignal`](crate::TransportSignal)s carrying the tokens.
pub trait SmsTransport: Send + Sync {
    /// Divides a body into the parts of one multi-part SMS.
    fn divide_message(&self, text: &str) -> Vec<String> {
        courier_sms::divide_message(text)
    }

    /// Submits all `parts` to `address` as one multi-part request.
    ///
    /// `sent` and `delivered` hold one optional token per part.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport refuses the request.
    fn send_multipart(
        &self,
        address: &str,
        parts: &[String],
        sent: &[Option<ReceiptToken>],
        delivered: &[Option<ReceiptToken>],
    ) -> Result<()>;

    /// Submits a single part to `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport refuses the request.
    fn send_single(
        &self,
        address: &str,
        part: &str,
        sent: Option<&ReceiptToken>,
        delivered: Option<&ReceiptToken>,
    ) -> Result<()>;
}
