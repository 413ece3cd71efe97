//! Minimal TLV encoding used by the applet payloads.
//!
//! The applet speaks SIMPLE-TLV with one-byte tags and one-byte lengths;
//! no value ever exceeds 255 bytes on this wire.

use bytes::{BufMut, BytesMut};

use crate::error::ProtocolError;

/// Append a tag, length and value to the buffer
pub(crate) fn push_tlv(buf: &mut BytesMut, tag: u8, value: &[u8]) {
    debug_assert!(value.len() <= u8::MAX as usize);
    buf.put_u8(tag);
    buf.put_u8(value.len() as u8);
    buf.put_slice(value);
}

/// Iterator over consecutive TLV entries in a response payload.
///
/// A truncated trailing entry yields one `Malformed` error and then ends.
pub(crate) struct TlvIter<'a> {
    buf: &'a [u8],
}

impl<'a> TlvIter<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }
}

impl<'a> Iterator for TlvIter<'a> {
    type Item = Result<(u8, &'a [u8]), ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        if self.buf.len() < 2 {
            self.buf = &[];
            return Some(Err(ProtocolError::Malformed("truncated TLV header")));
        }
        let tag = self.buf[0];
        let len = self.buf[1] as usize;
        let Some(value) = self.buf.get(2..2 + len) else {
            self.buf = &[];
            return Some(Err(ProtocolError::Malformed("truncated TLV value")));
        };
        self.buf = &self.buf[2 + len..];
        Some(Ok((tag, value)))
    }
}

/// Find the first entry with the given tag
pub(crate) fn find_tlv(buf: &[u8], tag: u8) -> Result<&[u8], ProtocolError> {
    for entry in TlvIter::new(buf) {
        let (entry_tag, value) = entry?;
        if entry_tag == tag {
            return Ok(value);
        }
    }
    Err(ProtocolError::Malformed("expected TLV tag not present"))
}
