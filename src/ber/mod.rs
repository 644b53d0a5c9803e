//! BER codec for the SNMPv2c subset of ASN.1.
//!
//! SNMP uses BER with a fixed vocabulary: universal primitives, the SMIv2
//! APPLICATION tags, and context-tagged exception values and PDUs. That
//! vocabulary is small enough that a hand-rolled codec beats a general ASN.1
//! library, which would miss the SMI tags anyway.
//!
//! Decoding is zero-copy over [`bytes::Bytes`]; encoding writes backwards so
//! constructed lengths never need a pre-pass.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::Decoder;
pub use encode::EncodeBuf;
pub use length::{MAX_LENGTH, decode_length, encode_length};
