//! WSP primitive encoding and decoding.
//!
//! MMS PDUs are built from a handful of WAP-230 primitives: short and long
//! integers, variable-length unsigned integers, value lengths and
//! NUL-terminated strings.

use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};

/// Quote octet in front of a text string whose first byte is >= 0x80.
pub const QUOTE: u8 = 0x7F;

/// Marker for a value length that does not fit a single octet.
pub const LENGTH_QUOTE: u8 = 0x1F;

/// Largest length expressible as a short length.
pub const SHORT_LENGTH_MAX: usize = 30;

/// Opening octet of a quoted string.
pub const QUOTED_STRING: u8 = 0x22;

/// String terminator.
pub const END_OF_STRING: u8 = 0x00;

/// Writes a short integer (0..=127) with the high bit set.
///
/// # Errors
///
/// Returns an error if `value` is above 127.
pub fn put_short_integer(buf: &mut BytesMut, value: u8) -> Result<()> {
    if value > 0x7F {
        return Err(Error::ValueOutOfRange {
            kind: "short-integer",
            value: u64::from(value),
        });
    }
    buf.put_u8(value | 0x80);
    Ok(())
}

/// Writes a long integer: a short length followed by big-endian octets.
pub fn put_long_integer(buf: &mut BytesMut, value: u64) {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count().min(7);
    let significant = &bytes[skip..];
    // At most eight octets, always a valid short length.
    buf.put_u8(u8::try_from(significant.len()).unwrap_or(8));
    buf.put_slice(significant);
}

/// Writes an integer-value: short integer when it fits, long integer otherwise.
pub fn put_integer(buf: &mut BytesMut, value: u64) {
    match u8::try_from(value) {
        Ok(small) if small <= 0x7F => buf.put_u8(small | 0x80),
        _ => put_long_integer(buf, value),
    }
}

/// Writes a variable-length unsigned integer (7 bits per octet, MSB continues).
pub fn put_uintvar(buf: &mut BytesMut, value: u64) {
    let mut groups = [0u8; 10];
    let mut count = 0;
    let mut rest = value;
    loop {
        groups[count] = u8::try_from(rest & 0x7F).unwrap_or_default();
        count += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        let continuation = if i == 0 { 0x00 } else { 0x80 };
        buf.put_u8(groups[i] | continuation);
    }
}

/// Writes a value length: one octet up to 30, otherwise `0x1F` + uintvar.
pub fn put_value_length(buf: &mut BytesMut, len: usize) {
    match u8::try_from(len) {
        Ok(short) if len <= SHORT_LENGTH_MAX => buf.put_u8(short),
        _ => {
            buf.put_u8(LENGTH_QUOTE);
            put_uintvar(buf, len as u64);
        }
    }
}

/// Writes a NUL-terminated text string, quoting a leading high octet.
pub fn put_text_string(buf: &mut BytesMut, text: &[u8]) {
    if text.first().is_some_and(|b| *b >= 0x80) {
        buf.put_u8(QUOTE);
    }
    buf.put_slice(text);
    buf.put_u8(END_OF_STRING);
}

/// Writes a quoted string (`"` + text + NUL).
pub fn put_quoted_string(buf: &mut BytesMut, text: &[u8]) {
    buf.put_u8(QUOTED_STRING);
    buf.put_slice(text);
    buf.put_u8(END_OF_STRING);
}

/// Writes an encoded-string-value: value length, charset, then text.
pub fn put_encoded_string(buf: &mut BytesMut, text: &[u8], charset: u16) {
    let mut inner = BytesMut::with_capacity(text.len() + 4);
    put_integer(&mut inner, u64::from(charset));
    put_text_string(&mut inner, text);
    put_value_length(buf, inner.len());
    buf.put_slice(&inner);
}

/// Cursor over an encoded PDU.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader at the start of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns true once all input is consumed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the next octet without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Reads one octet.
    ///
    /// # Errors
    ///
    /// Returns an error at end of input.
    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = self.peek().ok_or(Error::Truncated(self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads `len` raw octets.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than `len` octets remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(Error::Truncated(self.pos))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Reads a variable-length unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the input ends early or the value exceeds 64 bits.
    pub fn read_uintvar(&mut self) -> Result<u64> {
        let mut value: u64 = 0;
        for _ in 0..10 {
            let byte = self.read_u8()?;
            value = value
                .checked_mul(128)
                .ok_or_else(|| Error::Malformed("uintvar overflow".into()))?
                | u64::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::Malformed("uintvar longer than 10 octets".into()))
    }

    /// Reads a value length (short length or `0x1F` + uintvar).
    ///
    /// # Errors
    ///
    /// Returns an error if the next octet is not a length.
    pub fn read_value_length(&mut self) -> Result<usize> {
        let first = self.read_u8()?;
        match first {
            0..=30 => Ok(usize::from(first)),
            LENGTH_QUOTE => {
                let len = self.read_uintvar()?;
                usize::try_from(len).map_err(|_| Error::Malformed("length overflow".into()))
            }
            _ => Err(Error::Malformed(format!(
                "expected value length, found 0x{first:02X}"
            ))),
        }
    }

    /// Reads a NUL-terminated text string, dropping a leading quote.
    ///
    /// # Errors
    ///
    /// Returns an error if no terminator is found.
    pub fn read_text_string(&mut self) -> Result<&'a [u8]> {
        if self.peek() == Some(QUOTE) {
            self.pos += 1;
        }
        let rest = &self.data[self.pos.min(self.data.len())..];
        let end = rest
            .iter()
            .position(|b| *b == END_OF_STRING)
            .ok_or(Error::Truncated(self.data.len()))?;
        let text = &rest[..end];
        self.pos += end + 1;
        Ok(text)
    }

    /// Reads a long integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the length octet is invalid or input ends early.
    pub fn read_long_integer(&mut self) -> Result<u64> {
        let len = usize::from(self.read_u8()?);
        if len == 0 || len > 8 {
            return Err(Error::Malformed(format!("long integer of {len} octets")));
        }
        Ok(self
            .read_bytes(len)?
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    /// Reads an integer-value (short or long).
    ///
    /// # Errors
    ///
    /// Returns an error if the value is malformed.
    pub fn read_integer(&mut self) -> Result<u64> {
        match self.peek() {
            Some(b) if b >= 0x80 => {
                self.pos += 1;
                Ok(u64::from(b & 0x7F))
            }
            Some(_) => self.read_long_integer(),
            None => Err(Error::Truncated(self.pos)),
        }
    }

    /// Reads an encoded-string-value, returning the text bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is malformed.
    pub fn read_encoded_string(&mut self) -> Result<&'a [u8]> {
        match self.peek() {
            Some(b) if usize::from(b) <= SHORT_LENGTH_MAX || b == LENGTH_QUOTE => {
                let len = self.read_value_length()?;
                let end = self.pos + len;
                let _charset = self.read_integer()?;
                let text = self.read_text_string()?;
                if self.pos != end {
                    return Err(Error::Malformed("encoded string length mismatch".into()));
                }
                Ok(text)
            }
            Some(_) => self.read_text_string(),
            None => Err(Error::Truncated(self.pos)),
        }
    }

    /// Skips one header value of any shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the value runs past the end of input.
    pub fn skip_value(&mut self) -> Result<()> {
        match self.peek().ok_or(Error::Truncated(self.pos))? {
            0..=30 | LENGTH_QUOTE => {
                let len = self.read_value_length()?;
                self.read_bytes(len)?;
            }
            32..=127 => {
                self.read_text_string()?;
            }
            _ => {
                self.pos += 1;
            }
        }
        Ok(())
    }
}
