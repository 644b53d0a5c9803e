//! BER decoding over a `Bytes` buffer.
//!
//! [`Decoder`] hands out zero-copy slices of the input. Sub-decoders returned
//! by [`Decoder::read_sequence`] and friends view only their element's
//! contents, so children are decoded in order until the slice is exhausted.

use bytes::Bytes;

use super::length::decode_length;
use super::tag;
use crate::error::{Error, MalformedKind, Result};
use crate::oid::Oid;

/// BER decoder reading forward through a byte buffer.
pub struct Decoder {
    data: Bytes,
    offset: usize,
}

impl Decoder {
    /// Create a decoder over the given bytes.
    pub fn new(data: Bytes) -> Self {
        Self { data, offset: 0 }
    }

    /// Create a decoder from a slice (copies the data).
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Current byte offset within this decoder's buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Whether the buffer is exhausted.
    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Look at the next identifier octet without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    fn read_byte(&mut self) -> Result<u8> {
        let byte = *self
            .data
            .get(self.offset)
            .ok_or(Error::malformed(self.offset, MalformedKind::Truncated))?;
        self.offset += 1;
        Ok(byte)
    }

    /// Read an identifier octet.
    ///
    /// High-tag-number form is never used by SNMPv2c and is rejected.
    pub fn read_tag(&mut self) -> Result<u8> {
        let tag = self.read_byte()?;
        if tag::is_high_tag_number(tag) {
            return Err(Error::malformed(
                self.offset - 1,
                MalformedKind::InvalidTag(tag),
            ));
        }
        Ok(tag)
    }

    /// Read the length octets following a tag.
    pub fn read_length(&mut self) -> Result<usize> {
        let (len, consumed) = decode_length(&self.data[self.offset..], self.offset)?;
        self.offset += consumed;
        if len > self.remaining() {
            return Err(Error::malformed(
                self.offset,
                MalformedKind::BufferTooShort {
                    needed: len,
                    available: self.remaining(),
                },
            ));
        }
        Ok(len)
    }

    /// Take `len` raw content bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        if self.offset.saturating_add(len) > self.data.len() {
            return Err(Error::malformed(
                self.offset,
                MalformedKind::BufferTooShort {
                    needed: len,
                    available: self.remaining(),
                },
            ));
        }
        let bytes = self.data.slice(self.offset..self.offset + len);
        self.offset += len;
        Ok(bytes)
    }

    /// Require a specific tag and return its content length.
    pub fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let actual = self.read_tag()?;
        if actual != expected {
            return Err(Error::malformed(
                self.offset - 1,
                MalformedKind::UnexpectedTag { expected, actual },
            ));
        }
        self.read_length()
    }

    /// Read an INTEGER, accepting up to 64 bits.
    pub fn read_integer(&mut self) -> Result<i64> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_value(len)
    }

    /// Read signed integer contents of a pre-read length.
    pub fn read_integer_value(&mut self, len: usize) -> Result<i64> {
        if len == 0 {
            return Err(Error::malformed(
                self.offset,
                MalformedKind::ZeroLengthInteger,
            ));
        }
        if len > 8 {
            return Err(Error::malformed(
                self.offset,
                MalformedKind::IntegerTooLong { length: len },
            ));
        }

        let bytes = self.read_bytes(len)?;
        let mut value: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        for &byte in bytes.iter() {
            value = (value << 8) | byte as i64;
        }
        Ok(value)
    }

    /// Read an INTEGER that must fit a signed 32-bit PDU header field.
    pub fn read_integer32(&mut self) -> Result<i32> {
        let start = self.offset;
        let value = self.read_integer()?;
        i32::try_from(value)
            .map_err(|_| Error::malformed(start, MalformedKind::IntegerTooLong { length: 8 }))
    }

    /// Read unsigned 32-bit contents (Counter32, Gauge32, TimeTicks) of a
    /// pre-read length. A single sign-padding zero octet is accepted.
    pub fn read_unsigned32_value(&mut self, len: usize) -> Result<u32> {
        if len == 0 {
            return Err(Error::malformed(
                self.offset,
                MalformedKind::ZeroLengthInteger,
            ));
        }
        if len > 5 {
            return Err(Error::malformed(
                self.offset,
                MalformedKind::IntegerTooLong { length: len },
            ));
        }

        let bytes = self.read_bytes(len)?;
        if len == 5 && bytes[0] != 0 {
            return Err(Error::malformed(
                self.offset - len,
                MalformedKind::IntegerTooLong { length: len },
            ));
        }
        let mut value: u32 = 0;
        for &byte in bytes.iter() {
            value = (value << 8) | byte as u32;
        }
        Ok(value)
    }

    /// Read unsigned 64-bit contents (Counter64) of a pre-read length.
    pub fn read_unsigned64_value(&mut self, len: usize) -> Result<u64> {
        if len == 0 {
            return Err(Error::malformed(
                self.offset,
                MalformedKind::ZeroLengthInteger,
            ));
        }
        if len > 9 {
            return Err(Error::malformed(
                self.offset,
                MalformedKind::IntegerTooLong { length: len },
            ));
        }

        let bytes = self.read_bytes(len)?;
        if len == 9 && bytes[0] != 0 {
            return Err(Error::malformed(
                self.offset - len,
                MalformedKind::IntegerTooLong { length: len },
            ));
        }
        let mut value: u64 = 0;
        for &byte in bytes.iter() {
            value = (value << 8) | byte as u64;
        }
        Ok(value)
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    /// Read a NULL.
    pub fn read_null(&mut self) -> Result<()> {
        let len = self.expect_tag(tag::universal::NULL)?;
        if len != 0 {
            return Err(Error::malformed(self.offset, MalformedKind::InvalidNull));
        }
        Ok(())
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        self.read_oid_value(len)
    }

    /// Read OID contents of a pre-read length.
    pub fn read_oid_value(&mut self, len: usize) -> Result<Oid> {
        let start = self.offset;
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes).map_err(|e| match e {
            // Re-anchor sub-parse offsets to this buffer.
            Error::Malformed { offset, kind } => Error::malformed(start + offset, kind),
            other => other,
        })
    }

    /// Read a SEQUENCE header and return a decoder over its contents.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read a constructed element with the given tag and return a decoder
    /// over its contents.
    pub fn read_constructed(&mut self, expected: u8) -> Result<Decoder> {
        let len = self.expect_tag(expected)?;
        let content = self.read_bytes(len)?;
        Ok(Decoder::new(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_integer() {
        let cases: &[(&[u8], i64)] = &[
            (&[0x02, 0x01, 0x00], 0),
            (&[0x02, 0x01, 0x7F], 127),
            (&[0x02, 0x02, 0x00, 0x80], 128),
            (&[0x02, 0x01, 0xFF], -1),
            (&[0x02, 0x01, 0x80], -128),
            (&[0x02, 0x02, 0xFF, 0x7F], -129),
            (
                &[0x02, 0x08, 0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
                i64::MAX,
            ),
            (
                &[0x02, 0x08, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
                i64::MIN,
            ),
        ];
        for (bytes, expected) in cases {
            let mut dec = Decoder::from_slice(bytes);
            assert_eq!(dec.read_integer().unwrap(), *expected);
            assert!(dec.is_empty());
        }
    }

    #[test]
    fn decode_non_minimal_integer() {
        // Permissive like net-snmp: padded encodings are accepted.
        let mut dec = Decoder::from_slice(&[0x02, 0x02, 0x00, 0x01]);
        assert_eq!(dec.read_integer().unwrap(), 1);

        let mut dec = Decoder::from_slice(&[0x02, 0x03, 0xFF, 0xFF, 0xFF]);
        assert_eq!(dec.read_integer().unwrap(), -1);
    }

    #[test]
    fn decode_integer_too_wide() {
        let mut dec = Decoder::from_slice(&[
            0x02, 0x09, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ]);
        assert!(matches!(
            dec.read_integer().unwrap_err(),
            Error::Malformed {
                kind: MalformedKind::IntegerTooLong { length: 9 },
                ..
            }
        ));
    }

    #[test]
    fn decode_zero_length_integer() {
        let mut dec = Decoder::from_slice(&[0x02, 0x00]);
        assert!(matches!(
            dec.read_integer().unwrap_err(),
            Error::Malformed {
                kind: MalformedKind::ZeroLengthInteger,
                ..
            }
        ));
    }

    #[test]
    fn decode_unsigned32_sign_pad() {
        // 0xFFFFFFFF with sign-padding zero.
        let mut dec = Decoder::from_slice(&[0x41, 0x05, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
        let len = dec.expect_tag(0x41).unwrap();
        assert_eq!(dec.read_unsigned32_value(len).unwrap(), u32::MAX);
    }

    #[test]
    fn decode_unsigned64_sign_pad() {
        let mut bytes = vec![0x46, 0x09, 0x00];
        bytes.extend_from_slice(&u64::MAX.to_be_bytes());
        let mut dec = Decoder::from_slice(&bytes);
        let len = dec.expect_tag(0x46).unwrap();
        assert_eq!(dec.read_unsigned64_value(len).unwrap(), u64::MAX);
    }

    #[test]
    fn decode_octet_string() {
        let mut dec = Decoder::from_slice(&[0x04, 0x05, b'h', b'e', b'l', b'l', b'o']);
        assert_eq!(&dec.read_octet_string().unwrap()[..], b"hello");
    }

    #[test]
    fn decode_null_rejects_contents() {
        let mut dec = Decoder::from_slice(&[0x05, 0x00]);
        dec.read_null().unwrap();

        let mut dec = Decoder::from_slice(&[0x05, 0x01, 0x00]);
        assert!(dec.read_null().is_err());
    }

    #[test]
    fn decode_sequence_children_in_order() {
        let mut dec = Decoder::from_slice(&[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]);
        let mut seq = dec.read_sequence().unwrap();
        assert_eq!(seq.read_integer().unwrap(), 1);
        assert_eq!(seq.read_integer().unwrap(), 2);
        assert!(seq.is_empty());
    }

    #[test]
    fn high_tag_number_rejected() {
        // 0x1F selects the multi-byte tag form.
        let mut dec = Decoder::from_slice(&[0x1F, 0x85, 0x22, 0x01, 0x00]);
        assert!(matches!(
            dec.read_tag().unwrap_err(),
            Error::Malformed {
                offset: 0,
                kind: MalformedKind::InvalidTag(0x1F),
            }
        ));
    }

    #[test]
    fn length_overrun_is_buffer_too_short() {
        // Claims 100 content bytes, provides 2.
        let mut dec = Decoder::from_slice(&[0x04, 0x64, 0xAA, 0xBB]);
        assert!(matches!(
            dec.read_octet_string().unwrap_err(),
            Error::Malformed {
                kind: MalformedKind::BufferTooShort { needed: 100, .. },
                ..
            }
        ));
    }

    #[test]
    fn unexpected_tag_reports_both() {
        let mut dec = Decoder::from_slice(&[0x04, 0x01, 0x00]);
        let err = dec.read_integer().unwrap_err();
        assert!(matches!(
            err,
            Error::Malformed {
                offset: 0,
                kind: MalformedKind::UnexpectedTag {
                    expected: 0x02,
                    actual: 0x04
                },
            }
        ));
    }
}
