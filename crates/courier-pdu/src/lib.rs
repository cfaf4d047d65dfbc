//! # courier-pdu
//!
//! Binary encoding of multimedia messages (OMA MMS encapsulation, WSP).
//!
//! ## Features
//!
//! - **Primitives**: WSP short/long integers, uintvars, value lengths and strings
//! - **Addresses**: Recipient validation with `/TYPE=PLMN`, `/TYPE=IPV4` and
//!   `/TYPE=IPV6` suffixes
//! - **Parts**: Named, typed parts with UTF-8 tagging for text
//! - **Presentation**: Generated SMIL manifest, always the first body part
//! - **m-send-req**: Full header and multipart body serialization
//! - **m-send-conf**: Response status, message id and response text
//!
//! ## Quick Start
//!
//! ```ignore
//! use courier_pdu::{Header, Part, PduBody, PduPart, SendRequest, compose, smil_document};
//!
//! let header = Header::new("T18c2f", &["+15551234567"], 1_700_000_000)?
//!     .with_subject(Some("Photos"));
//!
//! let mut body = PduBody::new();
//! body.add_part(PduPart::from_part(&Part::text("text", "Hello"))?);
//! body.insert_part(0, PduPart::smil(&smil_document(body.parts())));
//!
//! let bytes = compose(&SendRequest::new(header, body))?;
//! ```
//!
//! ### Reading the gateway response
//!
//! ```ignore
//! use courier_pdu::SendConf;
//!
//! let conf = SendConf::parse(&response_bytes)?;
//! if !conf.status.is_ok() {
//!     eprintln!("rejected: {}", conf.status);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod composer;
mod conf;
mod content_type;
mod error;
mod message;
mod part;
mod policy;
mod smil;

pub mod encoding;
pub mod header;

pub use address::{AddressType, Recipient, extract};
pub use composer::compose;
pub use conf::{ResponseStatus, SendConf};
pub use content_type::{
    APP_SMIL, ContentType, IMAGE_JPEG, MMS_MESSAGE, MULTIPART_RELATED, TEXT_PLAIN,
    well_known_code,
};
pub use error::{Error, Result};
pub use header::{CHARSET_UTF_8, Header, MessageClass, Priority};
pub use message::SendRequest;
pub use part::{Part, PduBody, PduPart};
pub use policy::{DroppedPart, FailurePolicy};
pub use smil::smil_document;
