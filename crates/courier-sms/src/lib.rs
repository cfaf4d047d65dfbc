//! # courier-sms
//!
//! Text-side building blocks for sending short messages.
//!
//! ## Features
//!
//! - **Segmentation**: Split long bodies into transport-sized chunks with
//!   optional `(i/total) ` ordinal counters
//! - **Length calculation**: GSM 03.38 7-bit vs. UCS-2 page counting
//! - **Division**: Cut a body into the parts a multi-part SMS will carry
//! - **Accent stripping**: Fold accented letters onto their base letters
//! - **Result codes**: Closed set of transport outcomes mapped from platform codes
//!
//! ## Quick Start
//!
//! ```ignore
//! use courier_sms::{segment, calculate_length};
//!
//! let body = "a".repeat(310);
//! let chunks = segment(&body, 150, false)?;
//! assert_eq!(chunks.len(), 3);
//!
//! let info = calculate_length(&body);
//! println!("{} pages, {} units left", info.message_count, info.code_units_remaining);
//! ```
//!
//! ## Code units
//!
//! All lengths in this crate are UTF-16 code units unless a function says
//! otherwise. Carrier-side length checks count the same way, so chunk
//! boundaries computed here line up with what the transport will accept.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod accents;
mod error;
mod length;
mod result;
mod segment;

pub use accents::strip_accents;
pub use error::{Error, Result};
pub use length::{
    Encoding, LengthInfo, MULTI_PART_GSM_7BIT, MULTI_PART_UCS2, SINGLE_PART_GSM_7BIT,
    SINGLE_PART_UCS2, calculate_length, divide_message, page_count,
};
pub use result::SendResult;
pub use segment::{COUNTER_RESERVE, SplitPlan, counter_width, plan_split, segment, utf16_len};
