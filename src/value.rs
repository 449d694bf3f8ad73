//! Typed device values.
//!
//! [`Value`] covers the SMIv2 data types a poller reads and writes, plus the
//! three exception markers an agent can return in place of data. The wire
//! codec for values lives in [`crate::wire`]; this module is the data model
//! and its checked accessors.

use crate::error::SyntaxErrorKind;
use crate::oid::Oid;
use bytes::Bytes;

/// A tagged device value.
///
/// Immutable once produced. The exception variants (`NoSuchObject`,
/// `NoSuchInstance`, `EndOfMibView`) are carried through untyped reads
/// unchanged; callers that need a concrete scalar must check for them,
/// see [`Value::syntax_error`] and [`crate::Client::get_scalar`].
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// INTEGER (signed 32-bit).
    Integer(i32),

    /// OCTET STRING (arbitrary bytes, often printable).
    OctetString(Bytes),

    /// NULL - placeholder in read requests.
    Null,

    /// OBJECT IDENTIFIER.
    ObjectIdentifier(Oid),

    /// IpAddress (4 bytes, network order).
    IpAddress([u8; 4]),

    /// Counter32 - unsigned 32-bit, monotonically increasing, wraps.
    Counter32(u32),

    /// Gauge32 / Unsigned32 - unsigned 32-bit, non-wrapping.
    Gauge32(u32),

    /// TimeTicks - hundredths of a second since device (re)initialization.
    TimeTicks(u32),

    /// Opaque (legacy wrapper, arbitrary bytes).
    Opaque(Bytes),

    /// Counter64 - unsigned 64-bit, monotonically increasing, wraps.
    Counter64(u64),

    /// noSuchObject - the agent does not implement this object at all.
    NoSuchObject,

    /// noSuchInstance - the object exists but this instance does not.
    NoSuchInstance,

    /// endOfMibView - enumeration ran past the agent's last object.
    EndOfMibView,

    /// Unrecognized tag, preserved verbatim for forward compatibility.
    Unknown { tag: u8, data: Bytes },
}

impl Value {
    /// As a signed 32-bit integer, for `Integer` only.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// As an unsigned 32-bit value.
    ///
    /// Accepts `Counter32`, `Gauge32`, `TimeTicks`, and non-negative
    /// `Integer`.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v),
            Value::Integer(v) if *v >= 0 => Some(*v as u32),
            _ => None,
        }
    }

    /// As an unsigned 64-bit value.
    ///
    /// Accepts `Counter64` plus everything [`as_u32`](Value::as_u32) does.
    /// This is the accessor counter sampling uses, so 32- and 64-bit octet
    /// counters are interchangeable there.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Counter64(v) => Some(*v),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v as u64),
            Value::Integer(v) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    /// As raw bytes, for `OctetString` and `Opaque`.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(v) | Value::Opaque(v) => Some(v),
            _ => None,
        }
    }

    /// As UTF-8 text, for `OctetString`/`Opaque` holding valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// As an OID, for `ObjectIdentifier` only.
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// As an IPv4 address, for `IpAddress` only.
    pub fn as_ip(&self) -> Option<std::net::Ipv4Addr> {
        match self {
            Value::IpAddress(bytes) => Some(std::net::Ipv4Addr::from(*bytes)),
            _ => None,
        }
    }

    /// True for the three exception markers.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// The exception kind this value represents, if any.
    ///
    /// ```
    /// use snmpoll::{Value, SyntaxErrorKind};
    ///
    /// assert_eq!(Value::NoSuchInstance.syntax_error(), Some(SyntaxErrorKind::NoSuchInstance));
    /// assert_eq!(Value::Integer(7).syntax_error(), None);
    /// ```
    pub fn syntax_error(&self) -> Option<SyntaxErrorKind> {
        match self {
            Value::NoSuchInstance => Some(SyntaxErrorKind::NoSuchInstance),
            Value::NoSuchObject => Some(SyntaxErrorKind::NoSuchObject),
            Value::EndOfMibView => Some(SyntaxErrorKind::EndOfView),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => write!(f, "0x{}", hex(data)),
            },
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(a) => write!(f, "{}.{}.{}.{}", a[0], a[1], a[2], a[3]),
            Value::Counter32(v) | Value::Gauge32(v) => write!(f, "{}", v),
            Value::TimeTicks(v) => {
                let secs = v / 100;
                write!(
                    f,
                    "{}d {}h {}m {}s",
                    secs / 86400,
                    (secs % 86400) / 3600,
                    (secs % 3600) / 60,
                    secs % 60
                )
            }
            Value::Opaque(data) => write!(f, "Opaque(0x{})", hex(data)),
            Value::Counter64(v) => write!(f, "{}", v),
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
            Value::Unknown { tag, data } => {
                write!(f, "Unknown(tag=0x{:02X}, data=0x{})", tag, hex(data))
            }
        }
    }
}

fn hex(data: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(data.len() * 2);
    for b in data {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Counter64(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::OctetString(data)
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<std::net::Ipv4Addr> for Value {
    fn from(addr: std::net::Ipv4Addr) -> Self {
        Value::IpAddress(addr.octets())
    }
}
