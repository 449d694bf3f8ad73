//! Error types for snmpoll.
//!
//! The taxonomy follows the failure modes of a polling core:
//!
//! - [`Error::Timeout`] - no reply within the retry budget, naming the target
//! - [`Error::Protocol`] - the device answered with a non-success status
//! - [`Error::Syntax`] - a returned value is an exception marker, not data
//! - [`Error::InvalidSample`] - the device clock did not advance between samples
//! - [`Error::Io`] - socket setup or transmit faults (fatal, not per-request)
//!
//! Errors are boxed for efficiency: `Result<T> = Result<T, Box<Error>>`.
//!
//! ```rust
//! use snmpoll::{Error, Result};
//!
//! fn report(result: Result<()>) {
//!     match result {
//!         Ok(()) => println!("ok"),
//!         Err(e) => match &*e {
//!             Error::Timeout { target, retries, .. } => {
//!                 println!("{} unreachable after {} retries", target, retries);
//!             }
//!             Error::Protocol { status, .. } => {
//!                 println!("device rejected request: {}", status);
//!             }
//!             _ => println!("error: {}", e),
//!         },
//!     }
//! }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use crate::oid::Oid;

/// Result type alias using the library's boxed error.
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// The main error type for all snmpoll operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Socket setup or I/O failure (bind, connect, send).
    ///
    /// Not a per-request outcome; a channel that cannot be opened or
    /// written to is unusable.
    #[error("I/O error communicating with {target}: {source}")]
    Io {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// No correlated reply arrived within the retry budget.
    #[error("timeout after {elapsed:?} waiting for {target} ({retries} retries)")]
    Timeout {
        target: SocketAddr,
        elapsed: Duration,
        retries: u32,
    },

    /// The device returned a non-success status (RFC 3416).
    #[error("SNMP error from {target}: {status} at index {index}")]
    Protocol {
        target: SocketAddr,
        status: ErrorStatus,
        /// 1-based index of the offending varbind, 0 if the error applies
        /// to the request as a whole.
        index: u32,
        /// OID of the offending varbind, when the index resolves to one.
        oid: Option<Oid>,
    },

    /// A returned value carries an exception marker instead of data.
    ///
    /// Raised only by callers that require a concrete scalar; the markers
    /// themselves pass through untyped reads unchanged.
    #[error("{kind} returned for {oid}")]
    Syntax { oid: Oid, kind: SyntaxErrorKind },

    /// BER-level parse failure in a reply.
    #[error("decode error at offset {offset}: {kind}")]
    Decode { offset: usize, kind: DecodeErrorKind },

    /// Reply was structurally valid BER but semantically unusable
    /// (wrong version, empty varbind list, mismatched request id).
    #[error("malformed response from {target}")]
    MalformedResponse { target: SocketAddr },

    /// Walk aborted because the agent misbehaved.
    #[error("walk aborted for {target}: {reason}")]
    WalkAborted {
        target: SocketAddr,
        reason: WalkAbortReason,
    },

    /// Non-positive elapsed device time between two timed samples.
    #[error("invalid sample interval: device clock advanced {elapsed_millis} ms")]
    InvalidSample { elapsed_millis: i64 },

    /// A sampled position does not hold a counter, so no rate can be
    /// derived from it.
    #[error("sample value at position {position} is not a counter")]
    NonNumericSample { position: usize },

    /// Invalid OID text or arc structure.
    #[error("invalid OID: {0}")]
    InvalidOid(Box<str>),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(Box<str>),
}

impl Error {
    /// Box this error (convenience for constructing boxed errors).
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// True for failures a retry might cure.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Error::Timeout { .. } | Error::Io { .. })
    }

    pub(crate) fn decode(offset: usize, kind: DecodeErrorKind) -> Box<Self> {
        Error::Decode { offset, kind }.boxed()
    }
}

/// Which exception marker produced an [`Error::Syntax`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// The object exists but the requested instance does not.
    NoSuchInstance,
    /// The object itself is not implemented by the agent.
    NoSuchObject,
    /// Enumeration ran past the end of the agent's view.
    EndOfView,
}

impl std::fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSuchInstance => write!(f, "noSuchInstance"),
            Self::NoSuchObject => write!(f, "noSuchObject"),
            Self::EndOfView => write!(f, "endOfMibView"),
        }
    }
}

/// Reason a walk operation was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum WalkAbortReason {
    /// Agent returned an OID that is not greater than the previous OID.
    NonIncreasing,
    /// Walk exceeded the configured result cap.
    ResultCap,
}

impl std::fmt::Display for WalkAbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonIncreasing => write!(f, "non-increasing OID"),
            Self::ResultCap => write!(f, "result cap exceeded"),
        }
    }
}

/// Detail for [`Error::Decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// Data ended before the announced length.
    Truncated,
    /// Length field is malformed or unsupported (indefinite form).
    InvalidLength,
    /// A different tag was required here.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Integer content does not fit the target width.
    IntegerOverflow,
    /// NULL with non-zero content length.
    InvalidNull,
    /// IpAddress content is not exactly 4 bytes.
    InvalidIpAddressLength { length: usize },
    /// Constructed OCTET STRING encoding is not accepted.
    ConstructedOctetString,
    /// PDU tag byte is not a known operation.
    UnknownPduType(u8),
    /// Message version is not SNMPv2c.
    UnknownVersion(i32),
    /// OID exceeds the subidentifier limit.
    OidTooLong { count: usize, max: usize },
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated => write!(f, "truncated data"),
            Self::InvalidLength => write!(f, "invalid length encoding"),
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{expected:02X}, found 0x{actual:02X}")
            }
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IpAddress with length {length}, expected 4")
            }
            Self::ConstructedOctetString => write!(f, "constructed OCTET STRING"),
            Self::UnknownPduType(tag) => write!(f, "unknown PDU type 0x{tag:02X}"),
            Self::UnknownVersion(v) => write!(f, "unsupported message version {v}"),
            Self::OidTooLong { count, max } => {
                write!(f, "OID with {count} arcs exceeds limit of {max}")
            }
        }
    }
}

/// SNMP protocol error status codes (RFC 3416).
///
/// Returned by agents in the error-status field of a response. Carried in
/// [`Error::Protocol`] together with the 1-based error index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    /// Operation completed successfully (status = 0).
    NoError,
    /// Response would be too large for transport (status = 1).
    TooBig,
    /// Requested OID not found (status = 2, v1 legacy).
    NoSuchName,
    /// Invalid value provided in a SET (status = 3).
    BadValue,
    /// Attempted to SET a read-only object (status = 4).
    ReadOnly,
    /// Unspecified error (status = 5).
    GenErr,
    /// Object exists but access is denied (status = 6).
    NoAccess,
    /// SET value has the wrong type (status = 7).
    WrongType,
    /// SET value has an incorrect length (status = 8).
    WrongLength,
    /// SET value uses a wrong encoding (status = 9).
    WrongEncoding,
    /// SET value is out of range (status = 10).
    WrongValue,
    /// Object does not support row creation (status = 11).
    NoCreation,
    /// Value inconsistent with other managed objects (status = 12).
    InconsistentValue,
    /// Resource required for the SET is unavailable (status = 13).
    ResourceUnavailable,
    /// SET commit phase failed (status = 14).
    CommitFailed,
    /// SET undo phase failed (status = 15).
    UndoFailed,
    /// Access denied by the agent's access control (status = 16).
    AuthorizationError,
    /// Object does not support modification (status = 17).
    NotWritable,
    /// Named object cannot be created (status = 18).
    InconsistentName,
    /// Unknown or future status code.
    Unknown(i32),
}

impl ErrorStatus {
    /// Create from a raw status code.
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
            other => Self::Unknown(other),
        }
    }

    /// Convert to the raw status code.
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
            Self::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_roundtrip() {
        for code in 0..=18 {
            assert_eq!(ErrorStatus::from_i32(code).as_i32(), code);
        }
        assert_eq!(ErrorStatus::from_i32(99), ErrorStatus::Unknown(99));
    }

    #[test]
    fn result_is_pointer_sized() {
        assert_eq!(
            std::mem::size_of::<Result<()>>(),
            std::mem::size_of::<*const ()>(),
        );
    }

    #[test]
    fn syntax_kind_display_matches_wire_names() {
        assert_eq!(SyntaxErrorKind::NoSuchInstance.to_string(), "noSuchInstance");
        assert_eq!(SyntaxErrorKind::NoSuchObject.to_string(), "noSuchObject");
        assert_eq!(SyntaxErrorKind::EndOfView.to_string(), "endOfMibView");
    }
}
