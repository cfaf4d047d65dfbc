//! Conversion of message content into MMS parts.

use courier_pdu::{DroppedPart, FailurePolicy, IMAGE_JPEG, Part};

use crate::message::Message;
use crate::{Error, Result};

/// Parts built from a message, plus whatever had to be left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltParts {
    /// Parts in send order.
    pub parts: Vec<Part>,
    /// Parts that failed conversion.
    pub dropped: Vec<DroppedPart>,
}

/// Builds the ordered part list of an MMS.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartBuilder {
    policy: FailurePolicy,
}

impl PartBuilder {
    /// Creates a builder with the given failure policy.
    #[must_use]
    pub const fn new(policy: FailurePolicy) -> Self {
        Self { policy }
    }

    /// Builds parts: images (`image0`, `image1`, ...) first, then the media
    /// attachment, then a `text` part if the body is not blank.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Strict`], returns [`Error::PartRejected`] for the
    /// first part that cannot be built. Best-effort builds never fail.
    pub fn build(&self, message: &Message) -> Result<BuiltParts> {
        let mut built = BuiltParts::default();

        for (i, image) in message.images.iter().enumerate() {
            let name = format!("image{i}");
            let part = image
                .to_jpeg()
                .map_err(|e| e.to_string())
                .and_then(|data| {
                    Part::new(name.as_str(), IMAGE_JPEG, data).map_err(|e| e.to_string())
                });
            self.collect(&mut built, name, part)?;
        }

        if let Some(media) = message.attachable_media() {
            let name = media.part_name().unwrap_or("media").to_string();
            let mime = media.attachable_type().unwrap_or_default();
            let part =
                Part::new(name.as_str(), mime, media.data.clone()).map_err(|e| e.to_string());
            self.collect(&mut built, name, part)?;
        }

        if !message.text.trim().is_empty() {
            built.parts.push(Part::text("text", &message.text));
        }

        tracing::debug!(
            parts = built.parts.len(),
            dropped = built.dropped.len(),
            "Built message parts"
        );
        Ok(built)
    }

    fn collect(
        &self,
        built: &mut BuiltParts,
        name: String,
        part: std::result::Result<Part, String>,
    ) -> Result<()> {
        match part {
            Ok(part) => {
                built.parts.push(part);
                Ok(())
            }
            Err(reason) if self.policy.is_strict() => Err(Error::PartRejected { name, reason }),
            Err(reason) => {
                tracing::warn!(part = %name, %reason, "Dropping part");
                built.dropped.push(DroppedPart::new(name, reason));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::{ImageError, ImageSource, JpegBytes, Media};

    #[derive(Debug)]
    struct BrokenImage;

    impl ImageSource for BrokenImage {
        fn to_jpeg(&self) -> std::result::Result<Vec<u8>, ImageError> {
            Err(ImageError("corrupt bitmap".into()))
        }
    }

    fn names(built: &BuiltParts) -> Vec<&str> {
        built.parts.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_order() {
        let msg = Message::new("Hello", ["A"])
            .with_image(JpegBytes(vec![1]))
            .with_image(JpegBytes(vec![2]))
            .with_media(Media::new(vec![3], "video/mp4"));
        let built = PartBuilder::default().build(&msg).unwrap();

        assert_eq!(names(&built), vec!["image0", "image1", "video", "text"]);
        assert_eq!(built.parts[0].mime_type, IMAGE_JPEG);
        assert_eq!(built.parts[2].mime_type, "video/mp4");
        assert_eq!(built.parts[3].data, b"Hello");
        assert!(built.dropped.is_empty());
    }

    #[test]
    fn test_blank_text_omitted() {
        let msg = Message::new("  \n", ["A"]).with_image(JpegBytes(vec![1]));
        let built = PartBuilder::default().build(&msg).unwrap();
        assert_eq!(names(&built), vec!["image0"]);
    }

    #[test]
    fn test_untyped_media_omitted() {
        let msg = Message::new("", ["A"]).with_media(Media {
            data: vec![1],
            mime_type: None,
        });
        let built = PartBuilder::default().build(&msg).unwrap();
        assert!(built.parts.is_empty());
    }

    #[test]
    fn test_best_effort_drops_and_counts() {
        let msg = Message::new("Hi", ["A"])
            .with_image(BrokenImage)
            .with_image(JpegBytes(vec![1]));
        let built = PartBuilder::new(FailurePolicy::BestEffort).build(&msg).unwrap();

        assert_eq!(names(&built), vec!["image1", "text"]);
        assert_eq!(built.dropped.len(), 1);
        assert_eq!(built.dropped[0].name, "image0");
        assert!(built.dropped[0].reason.contains("corrupt bitmap"));
    }

    #[test]
    fn test_strict_fails() {
        let msg = Message::new("Hi", ["A"]).with_image(BrokenImage);
        let err = PartBuilder::new(FailurePolicy::Strict).build(&msg).unwrap_err();
        assert!(matches!(err, Error::PartRejected { name, .. } if name == "image0"));
    }
}
