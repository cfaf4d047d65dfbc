//! Outgoing message model.

use std::fmt;
use std::sync::Arc;

/// Image conversion failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Image conversion failed: {0}")]
pub struct ImageError(pub String);

/// Source of an image attachment.
///
/// Images are converted to JPEG bytes only when the message is built into
/// parts, so a failing conversion drops just that image.
pub trait ImageSource: fmt::Debug + Send + Sync {
    /// Returns the image encoded as JPEG.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be encoded.
    fn to_jpeg(&self) -> Result<Vec<u8>, ImageError>;
}

/// Image that is already JPEG-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegBytes(pub Vec<u8>);

impl ImageSource for JpegBytes {
    fn to_jpeg(&self) -> Result<Vec<u8>, ImageError> {
        if self.0.is_empty() {
            return Err(ImageError("empty image".into()));
        }
        Ok(self.0.clone())
    }
}

/// Raw media attachment (video, audio, vCard, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    /// Media bytes.
    pub data: Vec<u8>,
    /// MIME type; media without one is never attached.
    pub mime_type: Option<String>,
}

impl Media {
    /// Creates a media attachment.
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: Some(mime_type.into()),
        }
    }

    /// Returns the MIME type if the media can be attached: a non-empty
    /// type and non-empty data.
    #[must_use]
    pub fn attachable_type(&self) -> Option<&str> {
        self.mime_type
            .as_deref()
            .filter(|mime| !mime.trim().is_empty() && !self.data.is_empty())
    }

    /// Part name: the first `/`-delimited segment of the MIME type.
    #[must_use]
    pub fn part_name(&self) -> Option<&str> {
        self.attachable_type()
            .and_then(|mime| mime.split('/').next())
            .filter(|name| !name.is_empty())
    }
}

/// Message to send.
#[derive(Debug, Clone)]
pub struct Message {
    /// Text body.
    pub text: String,
    /// Recipient addresses, in order.
    pub addresses: Vec<String>,
    /// Image attachments.
    pub images: Vec<Arc<dyn ImageSource>>,
    /// Raw media attachment.
    pub media: Option<Media>,
    /// Subject.
    pub subject: Option<String>,
    /// Whether to record the message in the store.
    pub save: bool,
}

impl Message {
    /// Creates a text message to the given recipients.
    #[must_use]
    pub fn new<S: Into<String>>(
        text: impl Into<String>,
        addresses: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            text: text.into(),
            addresses: addresses.into_iter().map(Into::into).collect(),
            images: Vec::new(),
            media: None,
            subject: None,
            save: true,
        }
    }

    /// Adds an image.
    #[must_use]
    pub fn with_image(mut self, image: impl ImageSource + 'static) -> Self {
        self.images.push(Arc::new(image));
        self
    }

    /// Sets the media attachment.
    #[must_use]
    pub fn with_media(mut self, media: Media) -> Self {
        self.media = Some(media);
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets whether the message is recorded in the store.
    #[must_use]
    pub const fn with_save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    /// Returns the attachable media, if any.
    #[must_use]
    pub fn attachable_media(&self) -> Option<&Media> {
        self.media.as_ref().filter(|m| m.attachable_type().is_some())
    }
}

/// Conversation a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadId {
    /// Unknown; resolved from the recipients.
    #[default]
    None,
    /// Existing thread.
    Id(i64),
}

impl ThreadId {
    /// Returns the thread to use as-is, if the hint can be trusted for
    /// `recipient_count` recipients.
    #[must_use]
    pub const fn usable_for(self, recipient_count: usize) -> Option<i64> {
        match self {
            Self::Id(id) if id > 0 && recipient_count <= 1 => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_media_attachable() {
        assert_eq!(Media::new(vec![1], "video/mp4").part_name(), Some("video"));
        assert!(Media::new(Vec::new(), "video/mp4").attachable_type().is_none());

        let untyped = Media {
            data: vec![1],
            mime_type: None,
        };
        assert!(untyped.attachable_type().is_none());

        let msg = Message::new("hi", ["A"]).with_media(untyped);
        assert!(msg.attachable_media().is_none());
    }

    #[test]
    fn test_jpeg_bytes() {
        assert_eq!(JpegBytes(vec![0xFF]).to_jpeg().unwrap(), vec![0xFF]);
        assert!(JpegBytes(Vec::new()).to_jpeg().is_err());
    }

    #[test]
    fn test_thread_hint() {
        assert_eq!(ThreadId::Id(7).usable_for(1), Some(7));
        assert_eq!(ThreadId::Id(7).usable_for(2), None);
        assert_eq!(ThreadId::Id(0).usable_for(1), None);
        assert_eq!(ThreadId::None.usable_for(1), None);
    }

    #[test]
    fn test_message_builder() {
        let msg = Message::new("Hello", ["A", "B"])
            .with_image(JpegBytes(vec![1]))
            .with_subject("s")
            .with_save(false);
        assert_eq!(msg.addresses, vec!["A", "B"]);
        assert_eq!(msg.images.len(), 1);
        assert!(!msg.save);
    }
}
