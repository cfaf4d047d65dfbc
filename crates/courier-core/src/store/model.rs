//! Store data models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use courier_pdu::Part;

/// Table a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Short message.
    Sms,
    /// Multimedia message.
    Mms,
}

/// Handle of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreLocation {
    /// Record kind.
    pub kind: RecordKind,
    /// Row id.
    pub id: i64,
}

impl StoreLocation {
    /// Location of an SMS record.
    #[must_use]
    pub const fn sms(id: i64) -> Self {
        Self {
            kind: RecordKind::Sms,
            id,
        }
    }

    /// Location of an MMS record.
    #[must_use]
    pub const fn mms(id: i64) -> Self {
        Self {
            kind: RecordKind::Mms,
            id,
        }
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RecordKind::Sms => write!(f, "sms/{}", self.id),
            RecordKind::Mms => write!(f, "mms/{}", self.id),
        }
    }
}

/// Mailbox folder of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Folder {
    /// Waiting to be sent.
    Outbox,
    /// Sent.
    Sent,
    /// Permanently failed.
    Failed,
}

impl Folder {
    /// Returns the stored name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outbox => "outbox",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for Folder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outbox" => Ok(Self::Outbox),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(format!("Unknown folder: {other}")),
        }
    }
}

/// Send status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendStatus {
    /// Handed to the transport, no outcome yet (or a transient failure).
    Queued,
    /// Left the device.
    Sent,
    /// Delivery confirmed.
    Delivered,
    /// Permanently failed.
    Failed,
}

impl SendStatus {
    /// Returns the stored name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for SendStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "failed" => Ok(Self::Failed),
            other => Err(format!("Unknown status: {other}")),
        }
    }
}

impl fmt::Display for SendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conditional status update: applied only while the record is in `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// Status the record must currently have.
    pub from: SendStatus,
    /// New status.
    pub to: SendStatus,
    /// New folder.
    pub folder: Folder,
    /// Platform error code to record.
    pub error_code: Option<i32>,
}

/// New SMS outbox row, one per recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxRecord {
    /// Recipient address.
    pub address: String,
    /// Body snapshot.
    pub body: String,
    /// Conversation thread.
    pub thread_id: i64,
    /// Submission time.
    pub timestamp: DateTime<Utc>,
}

/// MMS to persist, as it was encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalMessage {
    /// Recipient addresses.
    pub recipients: Vec<String>,
    /// Subject.
    pub subject: Option<String>,
    /// Content parts, without the presentation manifest.
    pub parts: Vec<Part>,
    /// SMIL manifest, when the primary persister stores it.
    pub manifest: Option<String>,
    /// Transaction identifier.
    pub transaction_id: String,
    /// Submission time.
    pub timestamp: DateTime<Utc>,
    /// Sent as a group conversation.
    pub group: bool,
}

impl LogicalMessage {
    /// Total bytes across all parts.
    #[must_use]
    pub fn data_size(&self) -> usize {
        self.parts.iter().map(|p| p.data.len()).sum()
    }

    /// Text of the message: the UTF-8 text parts joined together.
    #[must_use]
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|p| p.is_text())
            .map(|p| String::from_utf8_lossy(&p.data))
            .collect()
    }
}

/// Persisted send record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRecord {
    /// Where the record lives.
    pub location: StoreLocation,
    /// Conversation thread.
    pub thread_id: i64,
    /// Recipient addresses.
    pub addresses: Vec<String>,
    /// Body snapshot.
    pub body: String,
    /// Submission time.
    pub timestamp: DateTime<Utc>,
    /// Current status.
    pub status: SendStatus,
    /// Current folder.
    pub folder: Folder,
    /// Last platform error code, if any.
    pub error_code: Option<i32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for status in [
            SendStatus::Queued,
            SendStatus::Sent,
            SendStatus::Delivered,
            SendStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<SendStatus>().unwrap(), status);
        }
        assert_eq!("outbox".parse::<Folder>().unwrap(), Folder::Outbox);
        assert!("trash".parse::<Folder>().is_err());
    }

    #[test]
    fn test_location_display() {
        assert_eq!(StoreLocation::sms(4).to_string(), "sms/4");
        assert_eq!(StoreLocation::mms(9).to_string(), "mms/9");
    }

    #[test]
    fn test_logical_message_text() {
        let msg = LogicalMessage {
            recipients: vec!["A".into()],
            subject: None,
            parts: vec![
                Part::new("image0", "image/jpeg", vec![1, 2, 3]).unwrap(),
                Part::text("text", "Hello"),
            ],
            manifest: None,
            transaction_id: "T1".into(),
            timestamp: Utc::now(),
            group: false,
        };
        assert_eq!(msg.text(), "Hello");
        assert_eq!(msg.data_size(), 8);
    }
}
