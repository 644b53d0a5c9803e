//! BER encoding.
//!
//! [`EncodeBuf`] writes backwards: content first, then length, then tag.
//! Nested constructed elements therefore never need their lengths computed
//! in advance, and every length comes out in the shortest definite form.

use bytes::Bytes;

use super::length::encode_length;
use super::tag;
use crate::oid::Oid;

/// Reverse-writing BER encode buffer.
///
/// Elements must be pushed in reverse field order; [`EncodeBuf::finish`]
/// reverses the buffer once to produce the final bytes.
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create a buffer with a capacity suited to typical SNMP messages.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append content bytes (stored reversed for later un-reversal).
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().rev());
    }

    /// Append length octets for `len`.
    pub fn push_length(&mut self, len: usize) {
        let (octets, count) = encode_length(len);
        // encode_length already returns octets reversed.
        self.buf.extend_from_slice(&octets[..count]);
    }

    /// Append an identifier octet.
    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Encode a constructed element: the closure writes the contents (in
    /// reverse field order), then length and tag are prepended.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let mark = self.len();
        f(self);
        let content_len = self.len() - mark;
        self.push_length(content_len);
        self.push_tag(tag);
    }

    /// Encode a SEQUENCE.
    pub fn push_sequence<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Encode an INTEGER in minimal two's-complement form.
    pub fn push_integer(&mut self, value: i64) {
        let (bytes, len) = integer_content(value);
        self.push_bytes(&bytes[8 - len..]);
        self.push_length(len);
        self.push_tag(tag::universal::INTEGER);
    }

    /// Encode an unsigned 32-bit value under an application tag
    /// (Counter32, Gauge32, TimeTicks).
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) {
        let (bytes, len) = unsigned_content::<5>(&value.to_be_bytes());
        self.push_bytes(&bytes[5 - len..]);
        self.push_length(len);
        self.push_tag(tag);
    }

    /// Encode a Counter64.
    pub fn push_unsigned64(&mut self, value: u64) {
        let (bytes, len) = unsigned_content::<9>(&value.to_be_bytes());
        self.push_bytes(&bytes[9 - len..]);
        self.push_length(len);
        self.push_tag(tag::application::COUNTER64);
    }

    /// Encode an OCTET STRING.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_bytes(data);
        self.push_length(data.len());
        self.push_tag(tag::universal::OCTET_STRING);
    }

    /// Encode a NULL.
    pub fn push_null(&mut self) {
        self.push_length(0);
        self.push_tag(tag::universal::NULL);
    }

    /// Encode a BOOLEAN.
    pub fn push_boolean(&mut self, value: bool) {
        self.buf.push(if value { 0xFF } else { 0x00 });
        self.push_length(1);
        self.push_tag(tag::universal::BOOLEAN);
    }

    /// Encode an OBJECT IDENTIFIER.
    pub fn push_oid(&mut self, oid: &Oid) {
        let content = oid.to_ber();
        self.push_bytes(&content);
        self.push_length(content.len());
        self.push_tag(tag::universal::OBJECT_IDENTIFIER);
    }

    /// Encode an IpAddress.
    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_bytes(&addr);
        self.push_length(4);
        self.push_tag(tag::application::IP_ADDRESS);
    }

    /// Reverse and return the encoded bytes.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }

    /// Reverse and return the encoded bytes as a `Vec<u8>`.
    pub fn finish_vec(mut self) -> Vec<u8> {
        self.buf.reverse();
        self.buf
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal two's-complement contents of a signed 64-bit integer.
///
/// The significant bytes sit at the end of the returned array. Zero encodes
/// as a single 0x00 octet.
#[inline]
fn integer_content(value: i64) -> ([u8; 8], usize) {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    if value >= 0 {
        while start < 7 && bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0 {
            start += 1;
        }
    } else {
        while start < 7 && bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0 {
            start += 1;
        }
    }
    (bytes, 8 - start)
}

/// Minimal contents of an unsigned big-endian integer, sign-padded with one
/// leading 0x00 octet when the top bit of the first significant byte is set.
///
/// `N` must be one larger than the input width; significant bytes sit at the
/// end of the returned array.
#[inline]
fn unsigned_content<const N: usize>(be: &[u8]) -> ([u8; N], usize) {
    let mut out = [0u8; N];
    out[1..].copy_from_slice(be);

    let mut start = 0;
    while start < be.len() - 1 && be[start] == 0 {
        start += 1;
    }
    let significant = be.len() - start;

    if be[start] & 0x80 != 0 {
        // Keep one zero octet so the value stays non-negative.
        (out, significant + 1)
    } else {
        (out, significant)
    }
}
