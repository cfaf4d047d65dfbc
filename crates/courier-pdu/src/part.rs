//! Message parts.
//!
//! [`Part`] is what callers hand in: a name, a MIME type and bytes.
//! [`PduPart`] is the wire sub-record built from it, with the extra headers
//! a multipart body carries.

use crate::content_type::{APP_SMIL, ContentType, TEXT_PLAIN};
use crate::error::{Error, Result};
use crate::header::CHARSET_UTF_8;

/// Named, typed unit of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part name (e.g. `image0`, `text`).
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Raw bytes.
    pub data: Vec<u8>,
}

impl Part {
    /// Creates a part.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or MIME type is blank.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let name = name.into();
        let mime_type = mime_type.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidPart("Part name cannot be empty".into()));
        }
        if mime_type.trim().is_empty() {
            return Err(Error::InvalidPart(format!("Part {name} has no MIME type")));
        }
        Ok(Self {
            name,
            mime_type,
            data: data.into(),
        })
    }

    /// Creates a UTF-8 `text/plain` part.
    #[must_use]
    pub fn text(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            mime_type: TEXT_PLAIN.to_string(),
            data: text.as_bytes().to_vec(),
        }
    }

    /// Returns true for `text/*` parts.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.mime_type
            .get(..4)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("text"))
    }
}

/// Part as encoded inside a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PduPart {
    /// Content type, parameters stripped.
    pub content_type: ContentType,
    /// `name` parameter of the content type.
    pub name: Option<String>,
    /// Charset MIBenum, set for text parts.
    pub charset: Option<u16>,
    /// Content-ID, without angle brackets.
    pub content_id: Option<String>,
    /// Content-Location.
    pub content_location: Option<String>,
    /// Body bytes.
    pub data: Vec<u8>,
}

impl PduPart {
    /// Builds the wire sub-record for a part.
    ///
    /// Text parts are tagged UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the part's MIME type cannot be parsed.
    pub fn from_part(part: &Part) -> Result<Self> {
        let mut content_type = ContentType::parse(&part.mime_type)?;
        content_type.parameters.clear();
        let charset = part.is_text().then_some(CHARSET_UTF_8);

        Ok(Self {
            content_type,
            name: Some(part.name.clone()),
            charset,
            content_id: None,
            content_location: None,
            data: part.data.clone(),
        })
    }

    /// Builds the presentation part holding a SMIL document.
    #[must_use]
    pub fn smil(document: &str) -> Self {
        Self {
            content_type: ContentType::new("application", "smil"),
            name: None,
            charset: None,
            content_id: Some("smil".to_string()),
            content_location: Some("smil.xml".to_string()),
            data: document.as_bytes().to_vec(),
        }
    }

    /// Name written into the part header: name, else content location.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.content_location.as_deref())
    }

    /// Returns true if this is the SMIL presentation part.
    #[must_use]
    pub fn is_smil(&self) -> bool {
        self.content_type.essence() == APP_SMIL
    }
}

/// Ordered parts of a multipart body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PduBody {
    parts: Vec<PduPart>,
}

impl PduBody {
    /// Creates an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a part.
    pub fn add_part(&mut self, part: PduPart) {
        self.parts.push(part);
    }

    /// Inserts a part at `index`.
    pub fn insert_part(&mut self, index: usize, part: PduPart) {
        self.parts.insert(index.min(self.parts.len()), part);
    }

    /// Returns the parts in order.
    #[must_use]
    pub fn parts(&self) -> &[PduPart] {
        &self.parts
    }

    /// Number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns true if there are no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Total size of all part bodies.
    #[must_use]
    pub fn data_size(&self) -> usize {
        self.parts.iter().map(|p| p.data.len()).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_part_new_validates() {
        assert!(Part::new("", "text/plain", b"x".to_vec()).is_err());
        assert!(Part::new("text", " ", b"x".to_vec()).is_err());
        assert!(Part::new("text", "text/plain", b"x".to_vec()).is_ok());
    }

    #[test]
    fn test_part_is_text() {
        assert!(Part::text("text", "hi").is_text());
        assert!(Part::new("t", "TEXT/x-vcard", Vec::new()).unwrap().is_text());
        assert!(!Part::new("image0", "image/jpeg", Vec::new()).unwrap().is_text());
    }

    #[test]
    fn test_pdu_part_charset_only_for_text() {
        let text = PduPart::from_part(&Part::text("text", "hi")).unwrap();
        assert_eq!(text.charset, Some(CHARSET_UTF_8));

        let image =
            PduPart::from_part(&Part::new("image0", "image/jpeg", vec![1]).unwrap()).unwrap();
        assert_eq!(image.charset, None);
        assert_eq!(image.display_name(), Some("image0"));
    }

    #[test]
    fn test_pdu_part_rejects_bad_mime() {
        let part = Part::new("audio", "audio", vec![1, 2]).unwrap();
        assert!(PduPart::from_part(&part).is_err());
    }

    #[test]
    fn test_smil_part() {
        let smil = PduPart::smil("<smil/>");
        assert!(smil.is_smil());
        assert_eq!(smil.display_name(), Some("smil.xml"));
        assert_eq!(smil.content_id.as_deref(), Some("smil"));
    }

    #[test]
    fn test_body_insert_front() {
        let mut body = PduBody::new();
        body.add_part(PduPart::from_part(&Part::text("text", "a")).unwrap());
        body.insert_part(0, PduPart::smil("<smil/>"));
        assert_eq!(body.len(), 2);
        assert!(body.parts()[0].is_smil());
        assert_eq!(body.data_size(), 8);
    }
}
