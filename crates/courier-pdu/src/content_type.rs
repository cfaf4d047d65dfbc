//! Content type handling and the WSP well-known content type table.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// `text/plain`.
pub const TEXT_PLAIN: &str = "text/plain";
/// `image/jpeg`.
pub const IMAGE_JPEG: &str = "image/jpeg";
/// `application/smil`.
pub const APP_SMIL: &str = "application/smil";
/// `application/vnd.wap.multipart.related`.
pub const MULTIPART_RELATED: &str = "application/vnd.wap.multipart.related";
/// `application/vnd.wap.mms-message`, the HTTP body type for PDUs.
pub const MMS_MESSAGE: &str = "application/vnd.wap.mms-message";

/// WSP assigned numbers for content types (WAP-230 Appendix A).
const WELL_KNOWN: &[(&str, u8)] = &[
    ("*/*", 0x00),
    ("text/*", 0x01),
    ("text/html", 0x02),
    ("text/plain", 0x03),
    ("text/x-hdml", 0x04),
    ("text/x-ttml", 0x05),
    ("text/x-vcalendar", 0x06),
    ("text/x-vcard", 0x07),
    ("text/vnd.wap.wml", 0x08),
    ("text/vnd.wap.wmlscript", 0x09),
    ("text/vnd.wap.wta-event", 0x0A),
    ("multipart/*", 0x0B),
    ("multipart/mixed", 0x0C),
    ("multipart/form-data", 0x0D),
    ("multipart/byteranges", 0x0E),
    ("multipart/alternative", 0x0F),
    ("application/*", 0x10),
    ("application/java-vm", 0x11),
    ("application/x-www-form-urlencoded", 0x12),
    ("application/x-hdmlc", 0x13),
    ("application/vnd.wap.wmlc", 0x14),
    ("application/vnd.wap.wmlscriptc", 0x15),
    ("application/vnd.wap.wta-eventc", 0x16),
    ("application/vnd.wap.uaprof", 0x17),
    ("application/vnd.wap.wtls-ca-certificate", 0x18),
    ("application/vnd.wap.wtls-user-certificate", 0x19),
    ("application/x-x509-ca-cert", 0x1A),
    ("application/x-x509-user-cert", 0x1B),
    ("image/*", 0x1C),
    ("image/gif", 0x1D),
    ("image/jpeg", 0x1E),
    ("image/tiff", 0x1F),
    ("image/png", 0x20),
    ("image/vnd.wap.wbmp", 0x21),
    ("application/vnd.wap.multipart.*", 0x22),
    ("application/vnd.wap.multipart.mixed", 0x23),
    ("application/vnd.wap.multipart.form-data", 0x24),
    ("application/vnd.wap.multipart.byteranges", 0x25),
    ("application/vnd.wap.multipart.alternative", 0x26),
    ("application/xml", 0x27),
    ("text/xml", 0x28),
    ("application/vnd.wap.wbxml", 0x29),
    ("application/x-x968-cross-cert", 0x2A),
    ("application/x-x968-ca-cert", 0x2B),
    ("application/x-x968-user-cert", 0x2C),
    ("text/vnd.wap.si", 0x2D),
    ("application/vnd.wap.sic", 0x2E),
    ("text/vnd.wap.sl", 0x2F),
    ("application/vnd.wap.slc", 0x30),
    ("text/vnd.wap.co", 0x31),
    ("application/vnd.wap.coc", 0x32),
    ("application/vnd.wap.multipart.related", 0x33),
    ("application/vnd.wap.sia", 0x34),
    ("text/vnd.wap.connectivity-xml", 0x35),
    ("application/vnd.wap.connectivity-wbxml", 0x36),
];

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "audio").
    pub main_type: String,
    /// Subtype (e.g., "plain", "jpeg", "smil").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8).
    pub parameters: BTreeMap<String, String>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Returns `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Returns the WSP assigned number for this type, if it has one.
    #[must_use]
    pub fn well_known_code(&self) -> Option<u8> {
        well_known_code(&self.essence())
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2=value2`
    ///
    /// # Errors
    ///
    /// Returns an error if the main type or subtype is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');

        let type_str = parts.next().unwrap_or_default().trim();
        let (main_type, sub_type) = type_str
            .split_once('/')
            .map(|(m, s)| (m.trim().to_lowercase(), s.trim().to_lowercase()))
            .filter(|(m, s)| !m.is_empty() && !s.is_empty())
            .ok_or_else(|| Error::InvalidContentType(s.to_string()))?;

        let mut content_type = Self::new(main_type, sub_type);

        for param in parts {
            if let Some((key, value)) = param.trim().split_once('=') {
                let key = key.trim().to_lowercase();
                let value = value.trim().trim_matches('"').to_string();
                content_type.parameters.insert(key, value);
            }
        }

        Ok(content_type)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        for (key, value) in &self.parameters {
            write!(f, "; {key}={value}")?;
        }
        Ok(())
    }
}

/// Looks up the WSP assigned number for a bare `type/subtype`.
#[must_use]
pub fn well_known_code(essence: &str) -> Option<u8> {
    WELL_KNOWN
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(essence))
        .map(|(_, code)| *code)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("text/plain; charset=utf-8").unwrap();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.parameters.get("charset").map(String::as_str), Some("utf-8"));
        assert!(ct.is_text());
    }

    #[test]
    fn test_content_type_parse_missing_subtype() {
        assert!(ContentType::parse("video").is_err());
        assert!(ContentType::parse("video/").is_err());
        assert!(ContentType::parse("").is_err());
    }

    #[test]
    fn test_content_type_display() {
        let ct = ContentType::parse("Audio/AMR; rate=8000").unwrap();
        assert_eq!(ct.to_string(), "audio/amr; rate=8000");
        assert_eq!(ct.essence(), "audio/amr");
    }

    #[test]
    fn test_well_known_codes() {
        assert_eq!(well_known_code(TEXT_PLAIN), Some(0x03));
        assert_eq!(well_known_code(IMAGE_JPEG), Some(0x1E));
        assert_eq!(well_known_code(MULTIPART_RELATED), Some(0x33));
        assert_eq!(well_known_code("text/x-vCard"), Some(0x07));
        assert_eq!(well_known_code(APP_SMIL), None);
        assert_eq!(well_known_code("video/mp4"), None);
    }
}
