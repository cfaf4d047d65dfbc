//! Transport result codes.
//!
//! The platform reports each send attempt with a raw integer. Those integers
//! are mapped once, here, onto a closed set of outcomes so the rest of the
//! pipeline never sees platform numbers.

use std::fmt;

use crate::error::Error;

/// Outcome of one SMS send attempt, as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendResult {
    /// The message left the device.
    Ok,
    /// Generic failure; will not be retried.
    GenericFailure,
    /// No cellular service.
    NoService,
    /// The transport was handed an empty PDU.
    NullPdu,
    /// The radio is switched off.
    RadioOff,
}

/// Platform integer codes and the outcome each one stands for.
const PLATFORM_CODES: [(i32, SendResult); 5] = [
    (-1, SendResult::Ok),
    (1, SendResult::GenericFailure),
    (2, SendResult::RadioOff),
    (3, SendResult::NullPdu),
    (4, SendResult::NoService),
];

impl SendResult {
    /// Maps a platform result code onto an outcome.
    #[must_use]
    pub fn from_platform_code(code: i32) -> Option<Self> {
        PLATFORM_CODES
            .iter()
            .find(|(raw, _)| *raw == code)
            .map(|(_, result)| *result)
    }

    /// Returns the platform code for this outcome.
    #[must_use]
    pub fn platform_code(self) -> i32 {
        PLATFORM_CODES
            .iter()
            .find(|(_, result)| *result == self)
            .map_or(0, |(raw, _)| *raw)
    }

    /// Returns true for a successful send.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns true for outcomes the platform is expected to retry on its own.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::NoService | Self::NullPdu | Self::RadioOff)
    }
}

impl TryFrom<i32> for SendResult {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_platform_code(code).ok_or(Error::UnknownResultCode(code))
    }
}

impl fmt::Display for SendResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::GenericFailure => write!(f, "generic failure"),
            Self::NoService => write!(f, "no service"),
            Self::NullPdu => write!(f, "null pdu"),
            Self::RadioOff => write!(f, "radio off"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_platform_code() {
        assert_eq!(SendResult::from_platform_code(-1), Some(SendResult::Ok));
        assert_eq!(
            SendResult::from_platform_code(1),
            Some(SendResult::GenericFailure)
        );
        assert_eq!(SendResult::from_platform_code(2), Some(SendResult::RadioOff));
        assert_eq!(SendResult::from_platform_code(3), Some(SendResult::NullPdu));
        assert_eq!(SendResult::from_platform_code(4), Some(SendResult::NoService));
        assert_eq!(SendResult::from_platform_code(99), None);
    }

    #[test]
    fn test_platform_code_round_trip() {
        for (raw, result) in PLATFORM_CODES {
            assert_eq!(result.platform_code(), raw);
        }
    }

    #[test]
    fn test_try_from_unknown() {
        assert_eq!(SendResult::try_from(7), Err(Error::UnknownResultCode(7)));
        assert_eq!(SendResult::try_from(-1).unwrap(), SendResult::Ok);
    }

    #[test]
    fn test_classification() {
        assert!(SendResult::Ok.is_success());
        assert!(!SendResult::GenericFailure.is_transient());
        assert!(SendResult::NoService.is_transient());
        assert!(SendResult::NullPdu.is_transient());
        assert!(SendResult::RadioOff.is_transient());
    }
}
