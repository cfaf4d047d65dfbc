//! Text segmentation for long bodies.
//!
//! A body is cut left to right at fixed code-unit boundaries; the final chunk
//! takes whatever remains. Ordinal counters are added after cutting, so a
//! caller that wants counters must shrink the chunk size first (see
//! [`plan_split`]).

use crate::error::{Error, Result};
use crate::length::calculate_length;

/// Code units reserved for a `(i/total) ` counter before the total is known.
///
/// Six units cover every total below ten.
pub const COUNTER_RESERVE: usize = 6;

/// Returns the length of `text` in UTF-16 code units.
#[must_use]
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Returns the widest `(i/total) ` prefix for a given total, in code units.
#[must_use]
pub fn counter_width(total: usize) -> usize {
    let digits = total.max(1).to_string().len();
    // "(" + i + "/" + total + ") "
    2 * digits + 4
}

/// Splits `body` into chunks of at most `chunk_size` UTF-16 code units.
///
/// When `add_counter` is set and more than one chunk results, every chunk is
/// prefixed with `"(i/total) "` using 1-based ordinals. An empty body yields
/// no chunks.
///
/// A surrogate pair is never split: if a boundary falls between its halves
/// the chunk ends early. A single character wider than `chunk_size` (only
/// possible with a size of one) occupies a chunk on its own.
///
/// # Errors
///
/// Returns [`Error::InvalidChunkSize`] when `chunk_size` is zero.
pub fn segment(body: &str, chunk_size: usize, add_counter: bool) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(Error::InvalidChunkSize(chunk_size));
    }

    let chunks = cut(body, chunk_size, char::len_utf16);

    if add_counter && chunks.len() > 1 {
        let total = chunks.len();
        return Ok(chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| format!("({}/{total}) {chunk}", i + 1))
            .collect());
    }

    Ok(chunks)
}

/// Cuts `text` greedily into pieces whose summed `width` stays within `limit`.
pub(crate) fn cut(text: &str, limit: usize, width: impl Fn(char) -> usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut used = 0;

    for ch in text.chars() {
        let w = width(ch);
        if used + w > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(ch);
        used += w;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Chunk size and counter decision for split-on-send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPlan {
    /// Code units per chunk, after any counter reservation.
    pub chunk_size: usize,
    /// Whether chunks get an ordinal counter.
    pub counter: bool,
}

/// Works out how to split `body` when split-on-send is enabled.
///
/// The per-message capacity is `(len + remaining) / pages` from the SMS
/// length calculation. With `counter_enabled` and a body longer than one
/// message, room for the counter is reserved: [`COUNTER_RESERVE`] units to
/// start with, widened while the resulting total needs a longer prefix
/// (totals of ten or more).
#[must_use]
pub fn plan_split(body: &str, counter_enabled: bool) -> SplitPlan {
    let info = calculate_length(body);
    let len = utf16_len(body);
    let capacity = ((len + info.code_units_remaining) / info.message_count.max(1)).max(1);

    if !counter_enabled || len <= capacity {
        return SplitPlan {
            chunk_size: capacity,
            counter: false,
        };
    }

    let mut reserve = COUNTER_RESERVE;
    loop {
        if capacity <= reserve {
            tracing::warn!(capacity, reserve, "No room left for split counter");
            return SplitPlan {
                chunk_size: capacity,
                counter: false,
            };
        }

        let chunk_size = capacity - reserve;
        let total = len.div_ceil(chunk_size);
        let needed = counter_width(total);
        if needed <= reserve {
            return SplitPlan {
                chunk_size,
                counter: true,
            };
        }
        reserve = needed;
    }
}
