//! Parsing of the gateway's m-send-conf response.

use std::fmt;

use crate::encoding::Reader;
use crate::error::{Error, Result};
use crate::header::{MESSAGE_TYPE_SEND_CONF, field};

/// X-Mms-Response-Status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseStatus(pub u8);

impl ResponseStatus {
    /// Accepted.
    pub const OK: Self = Self(0x80);

    /// Returns true if the gateway accepted the message.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        self.0 == Self::OK.0
    }

    /// Returns true for permanent failures (0xE0..=0xFF).
    #[must_use]
    pub const fn is_permanent_failure(self) -> bool {
        self.0 >= 0xE0
    }

    const fn description(self) -> &'static str {
        match self.0 {
            0x80 => "Ok",
            0x81 => "Error-unspecified",
            0x82 => "Error-service-denied",
            0x83 => "Error-message-format-corrupt",
            0x84 => "Error-sending-address-unresolved",
            0x85 => "Error-message-not-found",
            0x86 => "Error-network-problem",
            0x87 => "Error-content-not-accepted",
            0x88 => "Error-unsupported-message",
            0xC0..=0xDF => "Error-transient",
            0xE0..=0xFF => "Error-permanent",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.description(), self.0)
    }
}

/// Parsed m-send-conf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendConf {
    /// Response status.
    pub status: ResponseStatus,
    /// Transaction identifier echoed by the gateway.
    pub transaction_id: Option<String>,
    /// Message-ID assigned by the gateway.
    pub message_id: Option<String>,
    /// Free-form response text.
    pub response_text: Option<String>,
}

impl SendConf {
    /// Parses an m-send-conf PDU.
    ///
    /// Header fields other than the ones kept here are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the PDU is not an m-send-conf, has no response
    /// status, or is malformed.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let mut message_type = None;
        let mut status = None;
        let mut transaction_id = None;
        let mut message_id = None;
        let mut response_text = None;

        while !reader.is_empty() {
            let code = reader.read_u8()?;
            match code {
                field::MESSAGE_TYPE => message_type = Some(reader.read_u8()?),
                field::RESPONSE_STATUS => status = Some(ResponseStatus(reader.read_u8()?)),
                field::TRANSACTION_ID => transaction_id = Some(text(reader.read_text_string()?)),
                field::MESSAGE_ID => message_id = Some(text(reader.read_text_string()?)),
                field::RESPONSE_TEXT => response_text = Some(text(reader.read_encoded_string()?)),
                0x80..=0xFF => reader.skip_value()?,
                _ => {
                    // Application header: the code octet starts a token text name.
                    reader.read_text_string()?;
                    reader.skip_value()?;
                }
            }
        }

        match message_type {
            Some(MESSAGE_TYPE_SEND_CONF) => {}
            Some(other) => {
                return Err(Error::Malformed(format!(
                    "expected m-send-conf, found message type 0x{other:02X}"
                )));
            }
            None => return Err(Error::Malformed("missing message type".into())),
        }

        let status = status.ok_or_else(|| Error::Malformed("missing response status".into()))?;

        Ok(Self {
            status,
            transaction_id,
            message_id,
            response_text,
        })
    }
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
