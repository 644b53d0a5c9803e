//! Error types for snmp2c.
//!
//! This module provides:
//!
//! - [`Error`] - the main error type covering transport, codec, and agent failures
//! - [`ErrorStatus`] - SNMP protocol errors returned by agents (RFC 3416)
//! - [`MalformedKind`] - low-level codec fault detail carried by [`Error::Malformed`]
//!
//! # Error Handling
//!
//! ```rust
//! use snmp2c::{Error, ErrorStatus, Result};
//!
//! fn describe(result: Result<()>) {
//!     match result {
//!         Ok(()) => println!("ok"),
//!         Err(Error::Timeout { target, retries, .. }) => {
//!             println!("{} unreachable after {} retries", target, retries);
//!         }
//!         Err(Error::Agent { status: ErrorStatus::NoSuchName, index, .. }) => {
//!             println!("no such name at index {}", index);
//!         }
//!         Err(e) => println!("error: {}", e),
//!     }
//! }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use crate::oid::Oid;

/// Result type alias using the library's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for all snmp2c operations.
///
/// Low-level codec faults (invalid tag, buffer overrun) are reported as
/// [`Error::Malformed`] with the byte offset at which decoding failed and a
/// [`MalformedKind`] describing the fault.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No matching reply arrived within `timeout * (retries + 1)`.
    #[error("timeout after {elapsed:?} waiting for {target} ({retries} retries)")]
    Timeout {
        target: SocketAddr,
        elapsed: Duration,
        retries: u32,
    },

    /// Operation issued on a closed session, or the session closed while awaiting.
    #[error("session is closed")]
    Closed,

    /// Inbound bytes did not parse as a valid SNMP message.
    #[error("malformed message at offset {offset}: {kind}")]
    Malformed { offset: usize, kind: MalformedKind },

    /// Decoded a value tag outside the SMIv2 set.
    #[error("unsupported value type (tag 0x{tag:02X})")]
    UnsupportedValueType { tag: u8 },

    /// Inbound message carried a version other than SNMPv2c.
    #[error("unsupported SNMP version {version}")]
    UnsupportedVersion { version: i64 },

    /// Outbound serialization exceeds the UDP payload limit.
    #[error("encoded message is {size} bytes, over the {limit}-byte UDP payload limit")]
    MessageTooLarge { size: usize, limit: usize },

    /// Non-zero error-status in a GetResponse.
    ///
    /// `index` is the 1-based error-index from the PDU; `oid` is the varbind
    /// it names, when it names one.
    #[error("agent error: {status} at index {index}")]
    Agent {
        status: ErrorStatus,
        index: i32,
        oid: Option<Oid>,
    },

    /// A walk in strict mode received an OID that did not increase.
    #[error("walk loop detected: agent returned {current} after {previous}")]
    LoopDetected { previous: Oid, current: Oid },

    /// OID text form did not parse.
    #[error("invalid OID {input:?}: {reason}")]
    InvalidOid {
        input: Box<str>,
        reason: &'static str,
    },

    /// Socket-level failure.
    #[error("I/O error: {source}")]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Construct a [`Error::Malformed`] at the given offset.
    pub(crate) fn malformed(offset: usize, kind: MalformedKind) -> Self {
        Error::Malformed { offset, kind }
    }

    pub(crate) fn invalid_oid(input: &str, reason: &'static str) -> Self {
        Error::InvalidOid {
            input: input.into(),
            reason,
        }
    }
}

/// Detail for [`Error::Malformed`]: what the decoder tripped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MalformedKind {
    /// Input ended before the element did.
    Truncated,
    /// Element length runs past the end of the buffer.
    BufferTooShort { needed: usize, available: usize },
    /// High-tag-number identifier form (tag number 31) is not used by SNMPv2c.
    InvalidTag(u8),
    /// A different tag was required at this position.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Indefinite length (0x80) is forbidden by BER for SNMP.
    IndefiniteLength,
    /// Length octet count of zero in long form.
    InvalidLength,
    /// Long-form length with more than four octets.
    LengthTooLong { octets: usize },
    /// Length exceeds the largest possible UDP datagram.
    LengthExceedsDatagram { length: usize },
    /// INTEGER with empty contents.
    ZeroLengthInteger,
    /// INTEGER contents too wide for the target type.
    IntegerTooLong { length: usize },
    /// NULL with non-zero length.
    InvalidNull,
    /// IpAddress contents were not exactly 4 bytes.
    InvalidIpAddressLength { length: usize },
    /// BOOLEAN contents were not exactly 1 byte.
    InvalidBooleanLength { length: usize },
    /// PDU tag outside the SNMPv2c set.
    UnknownPduType(u8),
    /// A reply PDU was not a GetResponse.
    UnexpectedPduType(u8),
    /// OID subidentifier overflowed 32 bits.
    ArcOverflow,
    /// OID with more subidentifiers than RFC 2578 allows.
    OidTooLong { count: usize, max: usize },
    /// Response PDU carried no varbinds where at least one was required.
    EmptyVarbindList,
}

impl std::fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated => write!(f, "truncated data"),
            Self::BufferTooShort { needed, available } => {
                write!(f, "need {} bytes, {} available", needed, available)
            }
            Self::InvalidTag(tag) => write!(f, "unsupported identifier octet 0x{:02X}", tag),
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, found 0x{:02X}", expected, actual)
            }
            Self::IndefiniteLength => write!(f, "indefinite length"),
            Self::InvalidLength => write!(f, "invalid length encoding"),
            Self::LengthTooLong { octets } => {
                write!(f, "length uses {} octets (max 4)", octets)
            }
            Self::LengthExceedsDatagram { length } => {
                write!(f, "length {} exceeds maximum datagram size", length)
            }
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::IntegerTooLong { length } => write!(f, "integer of {} bytes too wide", length),
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IpAddress of {} bytes (must be 4)", length)
            }
            Self::InvalidBooleanLength { length } => {
                write!(f, "BOOLEAN of {} bytes (must be 1)", length)
            }
            Self::UnknownPduType(tag) => write!(f, "unknown PDU tag 0x{:02X}", tag),
            Self::UnexpectedPduType(tag) => {
                write!(f, "reply PDU tag 0x{:02X} is not a GetResponse", tag)
            }
            Self::ArcOverflow => write!(f, "OID subidentifier exceeds 32 bits"),
            Self::OidTooLong { count, max } => {
                write!(f, "OID has {} subidentifiers (max {})", count, max)
            }
            Self::EmptyVarbindList => write!(f, "empty varbind list"),
        }
    }
}

/// SNMP protocol error status codes (RFC 3416 section 3).
///
/// A non-zero error-status in a GetResponse is surfaced to the caller as
/// [`Error::Agent`] carrying one of these kinds together with the 1-based
/// error-index.
///
/// # Example
///
/// ```
/// use snmp2c::ErrorStatus;
///
/// let status = ErrorStatus::from_i32(2);
/// assert_eq!(status, ErrorStatus::NoSuchName);
/// assert_eq!(status.as_i32(), 2);
/// assert_eq!(status.to_string(), "noSuchName");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    /// Operation succeeded (status 0). Never carried by [`Error::Agent`].
    NoError,
    /// Reply would not fit in a single message (status 1).
    TooBig,
    /// Requested variable is unknown (status 2).
    NoSuchName,
    /// SET value has a syntax or value error (status 3).
    BadValue,
    /// SET on a variable the community may not change (status 4).
    ReadOnly,
    /// Unspecified agent failure (status 5).
    GenErr,
    /// Variable is not accessible (status 6).
    NoAccess,
    /// SET value type does not match the variable (status 7).
    WrongType,
    /// SET value length does not match the variable (status 8).
    WrongLength,
    /// SET value encoding is inconsistent with its tag (status 9).
    WrongEncoding,
    /// SET value cannot be assigned to the variable (status 10).
    WrongValue,
    /// Variable does not exist and cannot be created (status 11).
    NoCreation,
    /// SET value is inconsistent with other managed objects (status 12).
    InconsistentValue,
    /// A resource needed by the SET is unavailable (status 13).
    ResourceUnavailable,
    /// SET commit phase failed (status 14).
    CommitFailed,
    /// SET undo phase failed (status 15).
    UndoFailed,
    /// Access denied (status 16).
    AuthorizationError,
    /// Variable exists but cannot be modified (status 17).
    NotWritable,
    /// Named instance is inconsistent with other managed objects (status 18).
    InconsistentName,
    /// Status code outside RFC 3416.
    Unknown(i32),
}

impl ErrorStatus {
    /// Map a raw error-status value to its kind.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            6 => Self::NoAccess,
            7 => Self::WrongType,
            8 => Self::WrongLength,
            9 => Self::WrongEncoding,
            10 => Self::WrongValue,
            11 => Self::NoCreation,
            12 => Self::InconsistentValue,
            13 => Self::ResourceUnavailable,
            14 => Self::CommitFailed,
            15 => Self::UndoFailed,
            16 => Self::AuthorizationError,
            17 => Self::NotWritable,
            18 => Self::InconsistentName,
            other => {
                tracing::warn!(target: "snmp2c::error", status = other, "unknown SNMP error status");
                Self::Unknown(other)
            }
        }
    }

    /// The raw error-status value.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::TooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenErr => 5,
            Self::NoAccess => 6,
            Self::WrongType => 7,
            Self::WrongLength => 8,
            Self::WrongEncoding => 9,
            Self::WrongValue => 10,
            Self::NoCreation => 11,
            Self::InconsistentValue => 12,
            Self::ResourceUnavailable => 13,
            Self::CommitFailed => 14,
            Self::UndoFailed => 15,
            Self::AuthorizationError => 16,
            Self::NotWritable => 17,
            Self::InconsistentName => 18,
            Self::Unknown(code) => *code,
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoError => write!(f, "noError"),
            Self::TooBig => write!(f, "tooBig"),
            Self::NoSuchName => write!(f, "noSuchName"),
            Self::BadValue => write!(f, "badValue"),
            Self::ReadOnly => write!(f, "readOnly"),
            Self::GenErr => write!(f, "genErr"),
            Self::NoAccess => write!(f, "noAccess"),
            Self::WrongType => write!(f, "wrongType"),
            Self::WrongLength => write!(f, "wrongLength"),
            Self::WrongEncoding => write!(f, "wrongEncoding"),
            Self::WrongValue => write!(f, "wrongValue"),
            Self::NoCreation => write!(f, "noCreation"),
            Self::InconsistentValue => write!(f, "inconsistentValue"),
            Self::ResourceUnavailable => write!(f, "resourceUnavailable"),
            Self::CommitFailed => write!(f, "commitFailed"),
            Self::UndoFailed => write!(f, "undoFailed"),
            Self::AuthorizationError => write!(f, "authorizationError"),
            Self::NotWritable => write!(f, "notWritable"),
            Self::InconsistentName => write!(f, "inconsistentName"),
            Self::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_roundtrip() {
        for code in 0..=18 {
            let status = ErrorStatus::from_i32(code);
            assert_eq!(status.as_i32(), code);
            assert!(!matches!(status, ErrorStatus::Unknown(_)));
        }
        assert_eq!(ErrorStatus::from_i32(99), ErrorStatus::Unknown(99));
        assert_eq!(ErrorStatus::Unknown(99).as_i32(), 99);
    }

    #[test]
    fn malformed_display_carries_offset() {
        let err = Error::malformed(17, MalformedKind::ZeroLengthInteger);
        let text = err.to_string();
        assert!(text.contains("offset 17"), "got: {text}");
        assert!(text.contains("zero-length integer"), "got: {text}");
    }
}
