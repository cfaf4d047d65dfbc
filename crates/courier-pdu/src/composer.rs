//! Binary serialization of an m-send-req.
//!
//! Produces the OMA MMS encapsulation form: header fields as WSP-encoded
//! name/value pairs, then a `application/vnd.wap.multipart.related` body
//! whose parts each carry their own WSP content-type and headers.

use bytes::{BufMut, BytesMut};

use crate::content_type::{ContentType, MULTIPART_RELATED, well_known_code};
use crate::encoding::{
    put_encoded_string, put_integer, put_long_integer, put_quoted_string, put_short_integer,
    put_text_string, put_uintvar, put_value_length,
};
use crate::error::{Error, Result};
use crate::header::{
    ADDRESS_PRESENT_TOKEN, CHARSET_UTF_8, Header, INSERT_ADDRESS_TOKEN, MESSAGE_TYPE_SEND_REQ,
    RELATIVE_TOKEN, field, yes_no,
};
use crate::message::SendRequest;
use crate::part::{PduBody, PduPart};

/// Well-known parameter codes (WAP-230 Table 38).
mod param {
    pub const CHARSET: u8 = 0x81;
    pub const TYPE: u8 = 0x89;
    pub const START: u8 = 0x8A;
    pub const NAME: u8 = 0x85;
}

/// Well-known part header codes (WAP-230 Table 39).
mod part_header {
    pub const CONTENT_LOCATION: u8 = 0x8E;
    pub const CONTENT_ID: u8 = 0xC0;
}

/// Serializes a send request.
///
/// # Errors
///
/// Returns an error if the request has no recipients, or a header value
/// does not fit its wire representation.
pub fn compose(request: &SendRequest) -> Result<Vec<u8>> {
    let mut buf = BytesMut::with_capacity(512 + request.body.data_size());

    write_header(&mut buf, &request.header)?;
    write_body_content_type(&mut buf, request)?;
    write_body(&mut buf, &request.body)?;

    tracing::debug!(
        bytes = buf.len(),
        parts = request.body.len(),
        "Composed m-send-req"
    );
    Ok(buf.to_vec())
}

fn write_header(buf: &mut BytesMut, header: &Header) -> Result<()> {
    if header.to.is_empty() {
        return Err(Error::NoRecipients);
    }

    buf.put_u8(field::MESSAGE_TYPE);
    buf.put_u8(MESSAGE_TYPE_SEND_REQ);

    buf.put_u8(field::TRANSACTION_ID);
    put_text_string(buf, header.transaction_id.as_bytes());

    buf.put_u8(field::MMS_VERSION);
    put_short_integer(buf, header.version)?;

    buf.put_u8(field::FROM);
    match &header.from {
        Some(sender) => {
            let mut inner = BytesMut::new();
            inner.put_u8(ADDRESS_PRESENT_TOKEN);
            put_encoded_string(&mut inner, sender.encoded().as_bytes(), CHARSET_UTF_8);
            put_value_length(buf, inner.len());
            buf.put_slice(&inner);
        }
        None => {
            put_value_length(buf, 1);
            buf.put_u8(INSERT_ADDRESS_TOKEN);
        }
    }

    for recipient in &header.to {
        buf.put_u8(field::TO);
        put_encoded_string(buf, recipient.encoded().as_bytes(), CHARSET_UTF_8);
    }

    buf.put_u8(field::DATE);
    put_long_integer(buf, header.date);

    if let Some(subject) = header.subject.as_deref().filter(|s| !s.is_empty()) {
        buf.put_u8(field::SUBJECT);
        put_encoded_string(buf, subject.as_bytes(), CHARSET_UTF_8);
    }

    buf.put_u8(field::MESSAGE_CLASS);
    buf.put_u8(header.message_class.code());

    if let Some(seconds) = header.expiry {
        let mut inner = BytesMut::new();
        inner.put_u8(RELATIVE_TOKEN);
        put_long_integer(&mut inner, seconds);
        buf.put_u8(field::EXPIRY);
        put_value_length(buf, inner.len());
        buf.put_slice(&inner);
    }

    buf.put_u8(field::PRIORITY);
    buf.put_u8(header.priority.code());

    buf.put_u8(field::DELIVERY_REPORT);
    buf.put_u8(yes_no(header.delivery_report));

    buf.put_u8(field::READ_REPORT);
    buf.put_u8(yes_no(header.read_report));

    Ok(())
}

fn write_body_content_type(buf: &mut BytesMut, request: &SendRequest) -> Result<()> {
    let mut inner = BytesMut::new();
    let code = well_known_code(MULTIPART_RELATED)
        .ok_or_else(|| Error::InvalidContentType(MULTIPART_RELATED.to_string()))?;
    put_short_integer(&mut inner, code)?;

    if request.body.parts().first().is_some_and(PduPart::is_smil) {
        inner.put_u8(param::START);
        put_text_string(&mut inner, b"<smil>");
    }
    if let Some(start_type) = request.start_type() {
        inner.put_u8(param::TYPE);
        put_text_string(&mut inner, start_type.as_bytes());
    }

    buf.put_u8(field::CONTENT_TYPE);
    put_value_length(buf, inner.len());
    buf.put_slice(&inner);
    Ok(())
}

fn write_body(buf: &mut BytesMut, body: &PduBody) -> Result<()> {
    put_uintvar(buf, body.len() as u64);

    for part in body.parts() {
        let headers = part_headers(part)?;
        put_uintvar(buf, headers.len() as u64);
        put_uintvar(buf, part.data.len() as u64);
        buf.put_slice(&headers);
        buf.put_slice(&part.data);
    }
    Ok(())
}

fn part_headers(part: &PduPart) -> Result<BytesMut> {
    let mut content_type = BytesMut::new();
    write_media_type(&mut content_type, &part.content_type)?;
    if let Some(charset) = part.charset {
        content_type.put_u8(param::CHARSET);
        put_integer(&mut content_type, u64::from(charset));
    }
    if let Some(name) = part.display_name() {
        content_type.put_u8(param::NAME);
        put_text_string(&mut content_type, name.as_bytes());
    }

    let mut headers = BytesMut::new();
    put_value_length(&mut headers, content_type.len());
    headers.put_slice(&content_type);

    if let Some(id) = &part.content_id {
        headers.put_u8(part_header::CONTENT_ID);
        let id = if id.starts_with('<') {
            id.clone()
        } else {
            format!("<{id}>")
        };
        put_quoted_string(&mut headers, id.as_bytes());
    }
    if let Some(location) = &part.content_location {
        headers.put_u8(part_header::CONTENT_LOCATION);
        put_text_string(&mut headers, location.as_bytes());
    }

    Ok(headers)
}

fn write_media_type(buf: &mut BytesMut, content_type: &ContentType) -> Result<()> {
    match content_type.well_known_code() {
        Some(code) => put_short_integer(buf, code),
        None => {
            put_text_string(buf, content_type.essence().as_bytes());
            Ok(())
        }
    }
}
