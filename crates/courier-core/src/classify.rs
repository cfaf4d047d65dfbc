//! SMS vs. MMS routing.

use std::fmt;

use crate::config::Settings;
use crate::message::Message;

/// Transport a message goes out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendMode {
    /// One or more short messages.
    Sms,
    /// One multipart multimedia message.
    Mms,
}

/// Rule that forced a message onto MMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmsReason {
    /// At least one image is attached.
    Images,
    /// Typed media is attached.
    Media,
    /// The text needs more pages than the long-as-MMS threshold.
    LongText {
        /// Pages the text needs.
        pages: usize,
    },
    /// Several recipients with group messaging on.
    Group,
    /// A subject is set.
    Subject,
}

impl fmt::Display for MmsReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Images => write!(f, "images attached"),
            Self::Media => write!(f, "media attached"),
            Self::LongText { pages } => write!(f, "text spans {pages} pages"),
            Self::Group => write!(f, "group message"),
            Self::Subject => write!(f, "subject set"),
        }
    }
}

/// Routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Send as SMS.
    Sms,
    /// Send as MMS, for the given reason.
    Mms(MmsReason),
}

impl Classification {
    /// Returns the transport.
    #[must_use]
    pub const fn mode(self) -> SendMode {
        match self {
            Self::Sms => SendMode::Sms,
            Self::Mms(_) => SendMode::Mms,
        }
    }
}

/// Decides how `message` is sent.
///
/// Rules are checked in order and the first one that holds wins: images,
/// typed media, long text (when enabled), group with several recipients,
/// subject. A message matching none goes out as SMS.
#[must_use]
pub fn classify(message: &Message, settings: &Settings) -> Classification {
    let reason = if !message.images.is_empty() {
        Some(MmsReason::Images)
    } else if message.attachable_media().is_some() {
        Some(MmsReason::Media)
    } else if let Some(pages) = long_text_pages(message, settings) {
        Some(MmsReason::LongText { pages })
    } else if message.addresses.len() > 1 && settings.group {
        Some(MmsReason::Group)
    } else if message.subject.is_some() {
        Some(MmsReason::Subject)
    } else {
        None
    };

    let classification = reason.map_or(Classification::Sms, Classification::Mms);
    match reason {
        Some(reason) => tracing::debug!(%reason, "Routing message as MMS"),
        None => tracing::debug!("Routing message as SMS"),
    }
    classification
}

fn long_text_pages(message: &Message, settings: &Settings) -> Option<usize> {
    if !settings.send_long_as_mms {
        return None;
    }
    let pages = if settings.strip_unicode {
        courier_sms::page_count(&courier_sms::strip_accents(&message.text))
    } else {
        courier_sms::page_count(&message.text)
    };
    (pages > settings.send_long_as_mms_after).then_some(pages)
}
