//! SMS length calculation and message division.
//!
//! Bodies made only of GSM 03.38 default-alphabet characters travel as 7-bit
//! septets; anything else forces UCS-2. Multi-part messages lose room to the
//! concatenation header, so per-part capacity drops once a body spills over
//! a single page.

use crate::segment::{cut, utf16_len};

/// Septets in a single-part 7-bit message.
pub const SINGLE_PART_GSM_7BIT: usize = 160;
/// Septets per part in a multi-part 7-bit message.
pub const MULTI_PART_GSM_7BIT: usize = 153;
/// UTF-16 units in a single-part UCS-2 message.
pub const SINGLE_PART_UCS2: usize = 70;
/// UTF-16 units per part in a multi-part UCS-2 message.
pub const MULTI_PART_UCS2: usize = 67;

/// GSM 03.38 default alphabet (one septet each).
const GSM_BASIC: &str = "@£$¥èéùìòÇ\nØø\rÅåΔ_ΦΓΛΩΠΨΣΘΞÆæßÉ !\"#¤%&'()*+,-./0123456789:;<=>?\
                         ¡ABCDEFGHIJKLMNOPQRSTUVWXYZÄÖÑÜ§¿abcdefghijklmnopqrstuvwxyzäöñüà";

/// GSM 03.38 extension table (escape + one septet each).
const GSM_EXTENSION: &str = "\u{000C}^{}\\[~]|€";

/// Character encoding a body will be sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// GSM 03.38 7-bit default alphabet.
    Gsm7Bit,
    /// UCS-2 (16 bits per unit).
    Ucs2,
}

impl Encoding {
    /// Detects the encoding needed for `text`.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        if text.chars().all(|c| septets(c).is_some()) {
            Self::Gsm7Bit
        } else {
            Self::Ucs2
        }
    }

    /// Capacity of a lone message, in this encoding's units.
    #[must_use]
    pub const fn single_part_capacity(self) -> usize {
        match self {
            Self::Gsm7Bit => SINGLE_PART_GSM_7BIT,
            Self::Ucs2 => SINGLE_PART_UCS2,
        }
    }

    /// Capacity of each part of a concatenated message.
    #[must_use]
    pub const fn multi_part_capacity(self) -> usize {
        match self {
            Self::Gsm7Bit => MULTI_PART_GSM_7BIT,
            Self::Ucs2 => MULTI_PART_UCS2,
        }
    }

    fn width(self, c: char) -> usize {
        match self {
            Self::Gsm7Bit => septets(c).unwrap_or(1),
            Self::Ucs2 => c.len_utf16(),
        }
    }
}

/// Result of an SMS length calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthInfo {
    /// Number of messages (pages) the body needs.
    pub message_count: usize,
    /// Units consumed, in the encoding's units.
    pub code_units_used: usize,
    /// Units still free in the last page.
    pub code_units_remaining: usize,
    /// Encoding the body will use.
    pub encoding: Encoding,
}

fn septets(c: char) -> Option<usize> {
    if GSM_BASIC.contains(c) {
        Some(1)
    } else if GSM_EXTENSION.contains(c) {
        Some(2)
    } else {
        None
    }
}

/// Calculates how many pages `text` needs and how much room is left.
///
/// An empty body still counts as one page.
#[must_use]
pub fn calculate_length(text: &str) -> LengthInfo {
    let encoding = Encoding::detect(text);
    let used: usize = match encoding {
        Encoding::Gsm7Bit => text.chars().map(|c| encoding.width(c)).sum(),
        Encoding::Ucs2 => utf16_len(text),
    };

    let single = encoding.single_part_capacity();
    let (message_count, remaining) = if used <= single {
        (1, single - used)
    } else {
        let per_part = encoding.multi_part_capacity();
        let count = used.div_ceil(per_part);
        (count, count * per_part - used)
    };

    LengthInfo {
        message_count,
        code_units_used: used,
        code_units_remaining: remaining,
        encoding,
    }
}

/// Number of SMS pages `text` needs.
#[must_use]
pub fn page_count(text: &str) -> usize {
    calculate_length(text).message_count
}

/// Divides `text` into the parts of a multi-part SMS.
///
/// A body that fits one page comes back as a single part (an empty body as
/// one empty part). Longer bodies are cut at the multi-part capacity of their
/// encoding; extension characters are never separated from their escape.
#[must_use]
pub fn divide_message(text: &str) -> Vec<String> {
    let info = calculate_length(text);
    if info.message_count <= 1 {
        return vec![text.to_string()];
    }

    let encoding = info.encoding;
    let parts = cut(text, encoding.multi_part_capacity(), |c| encoding.width(c));
    tracing::trace!(parts = parts.len(), ?encoding, "Divided message");
    parts
}
