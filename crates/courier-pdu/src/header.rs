//! MMS header fields for an m-send-req.

use crate::address::{Recipient, extract};
use crate::error::{Error, Result};

/// Well-known header field codes (OMA-MMS-ENC, high bit set).
pub mod field {
    /// Bcc.
    pub const BCC: u8 = 0x81;
    /// Cc.
    pub const CC: u8 = 0x82;
    /// X-Mms-Content-Location.
    pub const CONTENT_LOCATION: u8 = 0x83;
    /// Content-Type.
    pub const CONTENT_TYPE: u8 = 0x84;
    /// Date.
    pub const DATE: u8 = 0x85;
    /// X-Mms-Delivery-Report.
    pub const DELIVERY_REPORT: u8 = 0x86;
    /// X-Mms-Delivery-Time.
    pub const DELIVERY_TIME: u8 = 0x87;
    /// X-Mms-Expiry.
    pub const EXPIRY: u8 = 0x88;
    /// From.
    pub const FROM: u8 = 0x89;
    /// X-Mms-Message-Class.
    pub const MESSAGE_CLASS: u8 = 0x8A;
    /// Message-ID.
    pub const MESSAGE_ID: u8 = 0x8B;
    /// X-Mms-Message-Type.
    pub const MESSAGE_TYPE: u8 = 0x8C;
    /// X-Mms-MMS-Version.
    pub const MMS_VERSION: u8 = 0x8D;
    /// X-Mms-Message-Size.
    pub const MESSAGE_SIZE: u8 = 0x8E;
    /// X-Mms-Priority.
    pub const PRIORITY: u8 = 0x8F;
    /// X-Mms-Read-Report.
    pub const READ_REPORT: u8 = 0x90;
    /// X-Mms-Report-Allowed.
    pub const REPORT_ALLOWED: u8 = 0x91;
    /// X-Mms-Response-Status.
    pub const RESPONSE_STATUS: u8 = 0x92;
    /// X-Mms-Response-Text.
    pub const RESPONSE_TEXT: u8 = 0x93;
    /// X-Mms-Sender-Visibility.
    pub const SENDER_VISIBILITY: u8 = 0x94;
    /// X-Mms-Status.
    pub const STATUS: u8 = 0x95;
    /// Subject.
    pub const SUBJECT: u8 = 0x96;
    /// To.
    pub const TO: u8 = 0x97;
    /// X-Mms-Transaction-Id.
    pub const TRANSACTION_ID: u8 = 0x98;
}

/// X-Mms-Message-Type value for m-send-req.
pub const MESSAGE_TYPE_SEND_REQ: u8 = 0x80;
/// X-Mms-Message-Type value for m-send-conf.
pub const MESSAGE_TYPE_SEND_CONF: u8 = 0x81;

/// MMS version 1.2 (major 1 in the high nibble, minor 2 in the low).
pub const MMS_VERSION_1_2: u8 = 0x12;

/// MIBenum for UTF-8.
pub const CHARSET_UTF_8: u16 = 106;

/// Address-present token inside a From value.
pub const ADDRESS_PRESENT_TOKEN: u8 = 0x80;
/// Insert-address token: the gateway fills in the sender.
pub const INSERT_ADDRESS_TOKEN: u8 = 0x81;

/// Relative-token inside an Expiry value.
pub const RELATIVE_TOKEN: u8 = 0x81;

/// Default relative expiry: one week.
pub const DEFAULT_EXPIRY_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Boolean header value.
const YES: u8 = 0x80;
const NO: u8 = 0x81;

/// Encodes a yes/no header value.
#[must_use]
pub const fn yes_no(flag: bool) -> u8 {
    if flag { YES } else { NO }
}

/// X-Mms-Message-Class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageClass {
    /// Person-to-person message.
    #[default]
    Personal,
    /// Advertisement.
    Advertisement,
    /// Informational.
    Informational,
    /// Automatically generated.
    Auto,
}

impl MessageClass {
    /// Returns the encoded octet.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Personal => 0x80,
            Self::Advertisement => 0x81,
            Self::Informational => 0x82,
            Self::Auto => 0x83,
        }
    }
}

/// X-Mms-Priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    /// Low.
    Low,
    /// Normal.
    #[default]
    Normal,
    /// High.
    High,
}

impl Priority {
    /// Returns the encoded octet.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Low => 0x80,
            Self::Normal => 0x81,
            Self::High => 0x82,
        }
    }
}

/// Header of an m-send-req.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Transaction identifier.
    pub transaction_id: String,
    /// MMS version octet.
    pub version: u8,
    /// Sender; `None` asks the gateway to insert it.
    pub from: Option<Recipient>,
    /// Recipients, never empty.
    pub to: Vec<Recipient>,
    /// Send date, Unix seconds.
    pub date: u64,
    /// Subject.
    pub subject: Option<String>,
    /// Message class.
    pub message_class: MessageClass,
    /// Relative expiry in seconds.
    pub expiry: Option<u64>,
    /// Priority.
    pub priority: Priority,
    /// Ask for a delivery report.
    pub delivery_report: bool,
    /// Ask for a read report.
    pub read_report: bool,
}

impl Header {
    /// Builds a header for the given recipients.
    ///
    /// Each entry may itself be a `;`-separated list; the first valid
    /// address of each entry is used and entries with none are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRecipients`] if no address survives validation.
    pub fn new<S: AsRef<str>>(
        transaction_id: impl Into<String>,
        recipients: &[S],
        date: u64,
    ) -> Result<Self> {
        let to: Vec<Recipient> = recipients
            .iter()
            .filter_map(|raw| {
                let first = extract(raw.as_ref()).into_iter().next();
                if first.is_none() {
                    tracing::warn!(recipient = raw.as_ref(), "Dropping invalid recipient");
                }
                first
            })
            .collect();

        if to.is_empty() {
            return Err(Error::NoRecipients);
        }

        Ok(Self {
            transaction_id: transaction_id.into(),
            version: MMS_VERSION_1_2,
            from: None,
            to,
            date,
            subject: None,
            message_class: MessageClass::default(),
            expiry: Some(DEFAULT_EXPIRY_SECONDS),
            priority: Priority::default(),
            delivery_report: false,
            read_report: false,
        })
    }

    /// Sets the sender. An address that fails validation leaves the sender
    /// unset so the gateway inserts it.
    #[must_use]
    pub fn with_from(mut self, from: Option<&str>) -> Self {
        self.from = from.and_then(|raw| match Recipient::parse(raw) {
            Ok(recipient) => Some(recipient),
            Err(e) => {
                tracing::debug!(%e, "Sender omitted from header");
                None
            }
        });
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: Option<&str>) -> Self {
        self.subject = subject.map(ToString::to_string);
        self
    }

    /// Sets the delivery-report flag.
    #[must_use]
    pub fn with_delivery_report(mut self, flag: bool) -> Self {
        self.delivery_report = flag;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_header_new_skips_invalid() {
        let header = Header::new("T1", &["5551234", "nope", "user@example.com"], 10).unwrap();
        assert_eq!(header.to.len(), 2);
        assert_eq!(header.version, MMS_VERSION_1_2);
        assert_eq!(header.expiry, Some(DEFAULT_EXPIRY_SECONDS));
    }

    #[test]
    fn test_header_new_no_recipients() {
        let err = Header::new("T1", &["", "nope"], 10).unwrap_err();
        assert_eq!(err, Error::NoRecipients);
    }

    #[test]
    fn test_header_from_invalid_is_omitted() {
        let header = Header::new("T1", &["5551234"], 10)
            .unwrap()
            .with_from(Some("unknown"));
        assert!(header.from.is_none());

        let header = header.with_from(Some("+15550000"));
        assert_eq!(header.from.unwrap().as_str(), "+15550000");
    }

    #[test]
    fn test_codes() {
        assert_eq!(MessageClass::Personal.code(), 0x80);
        assert_eq!(Priority::Normal.code(), 0x81);
        assert_eq!(yes_no(true), 0x80);
        assert_eq!(yes_no(false), 0x81);
    }
}
