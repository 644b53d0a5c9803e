//! SNMPv2c message framing.
//!
//! `Message ::= SEQUENCE { version INTEGER, community OCTET STRING, data PDU }`
//!
//! The community string is an opaque byte string on the wire; text handed to
//! the session is passed through verbatim.

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf};
use crate::error::{Error, Result};
use crate::pdu::Pdu;

/// The version integer carried by every SNMPv2c message.
pub const VERSION_2C: i64 = 1;

/// A complete SNMPv2c message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Community string.
    pub community: Bytes,
    /// The protocol data unit.
    pub pdu: Pdu,
}

impl Message {
    /// Create a message.
    pub fn new(community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            community: community.into(),
            pdu,
        }
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(VERSION_2C);
        });
        buf.finish()
    }

    /// Decode from wire bytes.
    ///
    /// Validates the outer SEQUENCE, that `version == 1`, that the PDU tag
    /// is in the accepted set, and that the varbind list is well formed.
    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;

        let version = seq.read_integer()?;
        if version != VERSION_2C {
            return Err(Error::UnsupportedVersion { version });
        }

        let community = seq.read_octet_string()?;
        let pdu = Pdu::decode(&mut seq)?;

        Ok(Message { community, pdu })
    }
}
