//! An m-send-req ready for serialization.

use crate::header::Header;
use crate::part::PduBody;

/// Header plus multipart body of an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    /// Header fields.
    pub header: Header,
    /// Body parts, presentation part first.
    pub body: PduBody,
}

impl SendRequest {
    /// Creates a request.
    #[must_use]
    pub const fn new(header: Header, body: PduBody) -> Self {
        Self { header, body }
    }

    /// Content type of the first body part, used as the `type` parameter of
    /// the multipart body.
    #[must_use]
    pub fn start_type(&self) -> Option<String> {
        self.body.parts().first().map(|p| p.content_type.essence())
    }
}
