//! MMS payload encoding.
//!
//! Turns recipients, header fields and built parts into the binary
//! m-send-req: the parts become multipart sub-records, a SMIL manifest is
//! generated for them and prepended, and the whole request is serialized.

use courier_pdu::{
    DroppedPart, FailurePolicy, Header, Part, PduBody, PduPart, SendRequest, compose,
    smil_document,
};

use crate::store::StoreLocation;
use crate::{Error, Result};

/// Header fields of an outgoing MMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Recipient addresses, as entered.
    pub recipients: Vec<String>,
    /// Subject.
    pub subject: Option<String>,
    /// Sender address; `None` lets the gateway insert it.
    pub sender: Option<String>,
    /// Send date, Unix seconds.
    pub date: u64,
    /// Transaction identifier.
    pub transaction_id: String,
    /// Ask for a delivery report.
    pub delivery_report: bool,
}

impl Envelope {
    /// Creates an envelope dated `date_millis`, with a transaction id
    /// derived from the same instant.
    #[must_use]
    pub fn new<S: AsRef<str>>(recipients: &[S], date_millis: i64) -> Self {
        let millis = u64::try_from(date_millis).unwrap_or_default();
        Self {
            recipients: recipients.iter().map(|r| r.as_ref().to_string()).collect(),
            subject: None,
            sender: None,
            date: millis / 1000,
            transaction_id: transaction_id(millis),
            delivery_report: false,
        }
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: Option<&str>) -> Self {
        self.subject = subject.map(ToString::to_string);
        self
    }

    /// Sets the sender.
    #[must_use]
    pub fn sender(mut self, sender: Option<&str>) -> Self {
        self.sender = sender.map(ToString::to_string);
        self
    }

    /// Sets the delivery-report flag.
    #[must_use]
    pub const fn delivery_report(mut self, flag: bool) -> Self {
        self.delivery_report = flag;
        self
    }
}

/// Transaction identifier: `T` followed by the send time in hex milliseconds.
#[must_use]
pub fn transaction_id(millis: u64) -> String {
    format!("T{millis:x}")
}

/// Result of encoding one message.
#[derive(Debug, Clone)]
pub struct Encoded {
    /// The request that was serialized.
    pub request: SendRequest,
    /// Serialized bytes.
    pub bytes: Vec<u8>,
    /// Parts left out of the body.
    pub dropped: Vec<DroppedPart>,
}

/// Bytes of one send attempt, with where they were recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    /// Serialized m-send-req.
    pub bytes: Vec<u8>,
    /// Stored record, if the message was saved.
    pub store_location: Option<StoreLocation>,
}

/// Serializes MMS send requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadEncoder {
    policy: FailurePolicy,
}

impl PayloadEncoder {
    /// Creates an encoder with the given failure policy.
    #[must_use]
    pub const fn new(policy: FailurePolicy) -> Self {
        Self { policy }
    }

    /// Encodes `parts` for the recipients in `envelope`.
    ///
    /// Recipients that fail validation are skipped. A part that cannot
    /// become a sub-record is dropped and reported, unless the policy is
    /// strict. The body always starts with the SMIL manifest, so `n`
    /// surviving parts give `n + 1` body parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecipients`] if no recipient is valid,
    /// [`Error::EncodingFailure`] if the request cannot be serialized, and
    /// [`Error::PartRejected`] for a bad part under the strict policy.
    pub fn encode(&self, envelope: &Envelope, parts: &[Part]) -> Result<Encoded> {
        let header = Header::new(
            envelope.transaction_id.as_str(),
            &envelope.recipients,
            envelope.date,
        )?
        .with_from(envelope.sender.as_deref())
        .with_subject(envelope.subject.as_deref())
        .with_delivery_report(envelope.delivery_report);

        let mut body = PduBody::new();
        let mut dropped = Vec::new();
        for part in parts {
            match PduPart::from_part(part) {
                Ok(pdu_part) => body.add_part(pdu_part),
                Err(e) if self.policy.is_strict() => {
                    return Err(Error::PartRejected {
                        name: part.name.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(part = %part.name, error = %e, "Dropping part from payload");
                    dropped.push(DroppedPart::new(part.name.as_str(), e));
                }
            }
        }

        let manifest = smil_document(body.parts());
        body.insert_part(0, PduPart::smil(&manifest));

        let request = SendRequest::new(header, body);
        let bytes = compose(&request)?;

        tracing::debug!(
            transaction_id = %envelope.transaction_id,
            recipients = request.header.to.len(),
            parts = request.body.len(),
            bytes = bytes.len(),
            "Encoded MMS payload"
        );

        Ok(Encoded {
            request,
            bytes,
            dropped,
        })
    }
}
