//! SNMPv2c Protocol Data Units.
//!
//! Every PDU in the v2c set shares one wire shape: an IMPLICIT-tagged
//! SEQUENCE of `request-id`, `error-status`, `error-index`, and the varbind
//! list. GetBulkRequest reuses the two error slots for `non-repeaters` and
//! `max-repetitions`, so a single [`Pdu`] struct covers the whole set with
//! accessors giving the slots their per-type names.

use crate::ber::{Decoder, EncodeBuf};
use crate::error::{Error, ErrorStatus, MalformedKind, Result};
use crate::oid::Oid;
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// PDU type tag (context class, constructed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PduType {
    GetRequest = 0xA0,
    GetNextRequest = 0xA1,
    Response = 0xA2,
    SetRequest = 0xA3,
    GetBulkRequest = 0xA5,
    SnmpV2Trap = 0xA7,
}

impl PduType {
    /// Map an identifier octet to a PDU type, if it is one this library
    /// accepts.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0xA0 => Some(Self::GetRequest),
            0xA1 => Some(Self::GetNextRequest),
            0xA2 => Some(Self::Response),
            0xA3 => Some(Self::SetRequest),
            0xA5 => Some(Self::GetBulkRequest),
            0xA7 => Some(Self::SnmpV2Trap),
            _ => None,
        }
    }

    /// The identifier octet.
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::GetRequest => "GetRequest",
            Self::GetNextRequest => "GetNextRequest",
            Self::Response => "GetResponse",
            Self::SetRequest => "SetRequest",
            Self::GetBulkRequest => "GetBulkRequest",
            Self::SnmpV2Trap => "SNMPv2-Trap",
        };
        f.write_str(name)
    }
}

/// An SNMPv2c PDU.
///
/// For [`PduType::GetBulkRequest`], `error_status` carries `non-repeaters`
/// and `error_index` carries `max-repetitions`; use
/// [`Pdu::non_repeaters`] / [`Pdu::max_repetitions`] to read them by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    /// PDU type.
    pub pdu_type: PduType,
    /// Request correlation id. Non-negative 31-bit when issued by this
    /// library; any signed 32-bit value is accepted on receive.
    pub request_id: i32,
    /// Error-status slot (non-repeaters for GetBulk).
    pub error_status: i32,
    /// Error-index slot (max-repetitions for GetBulk).
    pub error_index: i32,
    /// Variable bindings.
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    /// Build a GetRequest with NULL-valued varbinds.
    pub fn get_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::request(PduType::GetRequest, request_id, oids)
    }

    /// Build a GetNextRequest with NULL-valued varbinds.
    pub fn get_next_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::request(PduType::GetNextRequest, request_id, oids)
    }

    /// Build a SetRequest carrying typed values.
    pub fn set_request(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type: PduType::SetRequest,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// Build a GetBulkRequest.
    pub fn get_bulk_request(
        request_id: i32,
        non_repeaters: i32,
        max_repetitions: i32,
        oids: &[Oid],
    ) -> Self {
        Self {
            pdu_type: PduType::GetBulkRequest,
            request_id,
            error_status: non_repeaters,
            error_index: max_repetitions,
            varbinds: oids.iter().map(|oid| VarBind::null(oid.clone())).collect(),
        }
    }

    /// Build an SNMPv2-Trap PDU.
    pub fn trap(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type: PduType::SnmpV2Trap,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    fn request(pdu_type: PduType, request_id: i32, oids: &[Oid]) -> Self {
        Self {
            pdu_type,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().map(|oid| VarBind::null(oid.clone())).collect(),
        }
    }

    /// The non-repeaters count of a GetBulkRequest.
    pub fn non_repeaters(&self) -> i32 {
        self.error_status
    }

    /// The max-repetitions count of a GetBulkRequest.
    pub fn max_repetitions(&self) -> i32 {
        self.error_index
    }

    /// Whether a Response carries a non-zero error-status.
    pub fn is_error(&self) -> bool {
        self.pdu_type != PduType::GetBulkRequest && self.error_status != 0
    }

    /// The error-status as an [`ErrorStatus`] kind.
    pub fn error_status(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(self.pdu_type.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_integer(self.error_index as i64);
            buf.push_integer(self.error_status as i64);
            buf.push_integer(self.request_id as i64);
        });
    }

    /// Decode from BER.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let tag_offset = decoder.offset();
        let tag = decoder.read_tag()?;
        let pdu_type = PduType::from_tag(tag)
            .ok_or(Error::malformed(tag_offset, MalformedKind::UnknownPduType(tag)))?;

        let len = decoder.read_length()?;
        let content = decoder.read_bytes(len)?;
        let mut pdu = Decoder::new(content);

        let request_id = pdu.read_integer32()?;
        let error_status = pdu.read_integer32()?;
        let error_index = pdu.read_integer32()?;
        let varbinds = decode_varbind_list(&mut pdu)?;

        Ok(Pdu {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }
}
