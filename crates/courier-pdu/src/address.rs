//! Recipient addresses for MMS headers.
//!
//! Addresses travel as encoded-string-values. Phone numbers and IP addresses
//! carry a `/TYPE=` suffix so the gateway knows how to route them; e-mail
//! addresses go as-is.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{Error, Result};

/// Kind of address, which decides the `/TYPE=` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    /// Phone number on a public land mobile network.
    Plmn,
    /// RFC 822 e-mail address.
    Email,
    /// IPv4 address.
    Ipv4,
    /// IPv6 address.
    Ipv6,
}

impl AddressType {
    const fn suffix(self) -> Option<&'static str> {
        match self {
            Self::Plmn => Some("/TYPE=PLMN"),
            Self::Ipv4 => Some("/TYPE=IPV4"),
            Self::Ipv6 => Some("/TYPE=IPV6"),
            Self::Email => None,
        }
    }
}

/// Validated recipient address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Recipient {
    value: String,
    kind: AddressType,
}

impl Recipient {
    /// Validates and classifies an address.
    ///
    /// Spaces and parentheses are treated as phone-number formatting and
    /// removed before a number is checked.
    ///
    /// # Errors
    ///
    /// Returns an error if the address matches none of the known kinds.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        if trimmed.parse::<Ipv4Addr>().is_ok() {
            return Ok(Self::new(trimmed, AddressType::Ipv4));
        }

        let dialable: String = trimmed
            .chars()
            .filter(|c| !matches!(c, ' ' | '(' | ')'))
            .collect();
        if is_phone_number(&dialable) {
            return Ok(Self::new(dialable, AddressType::Plmn));
        }

        if is_email(trimmed) {
            return Ok(Self::new(trimmed, AddressType::Email));
        }

        if trimmed.parse::<Ipv6Addr>().is_ok() {
            return Ok(Self::new(trimmed, AddressType::Ipv6));
        }

        Err(Error::InvalidAddress(trimmed.to_string()))
    }

    fn new(value: impl Into<String>, kind: AddressType) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    /// Returns the normalized address without any type suffix.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns the address kind.
    #[must_use]
    pub const fn kind(&self) -> AddressType {
        self.kind
    }

    /// Returns the address as written into the PDU.
    #[must_use]
    pub fn encoded(&self) -> String {
        match self.kind.suffix() {
            Some(suffix) => format!("{}{suffix}", self.value),
            None => self.value.clone(),
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Extracts every valid address from a `;`-separated list.
///
/// Invalid entries are skipped.
#[must_use]
pub fn extract(raw: &str) -> Vec<Recipient> {
    raw.split(';')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| match Recipient::parse(entry) {
            Ok(recipient) => Some(recipient),
            Err(e) => {
                tracing::debug!(%e, "Skipping recipient");
                None
            }
        })
        .collect()
}

fn is_phone_number(s: &str) -> bool {
    let digits = s.strip_prefix('+').unwrap_or(s);
    !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
}

fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !s.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_number() {
        let r = Recipient::parse("+1 (555) 123-4567").unwrap();
        assert_eq!(r.kind(), AddressType::Plmn);
        assert_eq!(r.as_str(), "+1555123-4567");
        assert_eq!(r.encoded(), "+1555123-4567/TYPE=PLMN");
    }

    #[test]
    fn test_email() {
        let r = Recipient::parse("user@example.com").unwrap();
        assert_eq!(r.kind(), AddressType::Email);
        assert_eq!(r.encoded(), "user@example.com");
    }

    #[test]
    fn test_ip_addresses() {
        assert_eq!(
            Recipient::parse("10.0.0.1").unwrap().encoded(),
            "10.0.0.1/TYPE=IPV4"
        );
        assert_eq!(
            Recipient::parse("::1").unwrap().encoded(),
            "::1/TYPE=IPV6"
        );
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(Recipient::parse("").is_err());
        assert!(Recipient::parse("   ").is_err());
        assert!(Recipient::parse("not a number").is_err());
        assert!(Recipient::parse("+").is_err());
        assert!(Recipient::parse("@example.com").is_err());
        assert!(Recipient::parse("a@b@c").is_err());
    }

    #[test]
    fn test_extract_skips_invalid() {
        let list = extract("5551234;bogus;;user@example.com");
        let values: Vec<&str> = list.iter().map(Recipient::as_str).collect();
        assert_eq!(values, vec!["5551234", "user@example.com"]);
    }
}
