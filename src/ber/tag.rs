//! BER identifier octets used by SNMPv2c.
//!
//! Per X.690 section 8.1.2 an identifier octet packs the class (bits 8-7),
//! the constructed flag (bit 6), and the tag number (bits 5-1). SNMPv2c only
//! ever uses the low-tag-number form; tag number 31 announces the multi-byte
//! form and is rejected by the decoder.

/// Constructed flag (bit 6).
pub const CONSTRUCTED: u8 = 0x20;

/// Tag number bits. The all-ones pattern selects high-tag-number form.
pub const TAG_NUMBER_MASK: u8 = 0x1F;

/// Universal class.
pub mod universal {
    pub const BOOLEAN: u8 = 0x01;
    pub const INTEGER: u8 = 0x02;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    /// SEQUENCE / SEQUENCE OF (always constructed).
    pub const SEQUENCE: u8 = 0x30;
}

/// Application class: the SMIv2 types (RFC 2578).
pub mod application {
    pub const IP_ADDRESS: u8 = 0x40;
    pub const COUNTER32: u8 = 0x41;
    pub const GAUGE32: u8 = 0x42;
    pub const TIMETICKS: u8 = 0x43;
    pub const OPAQUE: u8 = 0x44;
    pub const COUNTER64: u8 = 0x46;
}

/// Context class, primitive: the SNMPv2 exception values.
pub mod context {
    pub const NO_SUCH_OBJECT: u8 = 0x80;
    pub const NO_SUCH_INSTANCE: u8 = 0x81;
    pub const END_OF_MIB_VIEW: u8 = 0x82;
}

/// Context class, constructed: the SNMPv2c PDU set.
pub mod pdu {
    pub const GET_REQUEST: u8 = 0xA0;
    pub const GET_NEXT_REQUEST: u8 = 0xA1;
    pub const RESPONSE: u8 = 0xA2;
    pub const SET_REQUEST: u8 = 0xA3;
    pub const GET_BULK_REQUEST: u8 = 0xA5;
    pub const SNMP_V2_TRAP: u8 = 0xA7;
}

/// Whether an identifier octet announces high-tag-number form.
#[inline]
pub const fn is_high_tag_number(tag: u8) -> bool {
    tag & TAG_NUMBER_MASK == TAG_NUMBER_MASK
}
