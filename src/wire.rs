//! SNMPv2c message framing and PDU codec.
//!
//! A message is `SEQUENCE { version INTEGER, community OCTET STRING, PDU }`.
//! The PDU carries the request identifier replies are correlated by, an
//! error status/index pair, and the varbind list.

use crate::ber::{Decoder, push_integer, push_null, push_oid, push_tlv, push_unsigned, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;
use bytes::Bytes;

/// Wire version number for SNMPv2c.
pub const VERSION_2C: i32 = 1;

/// Operation kind of a PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduKind {
    /// Read the named values.
    Get,
    /// Read the lexicographic successors of the named keys.
    GetNext,
    /// Write the bound values.
    Set,
    /// Agent reply to any of the above.
    Response,
}

impl PduKind {
    /// The context-class tag byte.
    pub fn tag(self) -> u8 {
        match self {
            Self::Get => tag::GET_REQUEST,
            Self::GetNext => tag::GET_NEXT_REQUEST,
            Self::Set => tag::SET_REQUEST,
            Self::Response => tag::RESPONSE,
        }
    }

    /// Recover the kind from a tag byte.
    pub fn from_tag(byte: u8) -> Option<Self> {
        match byte {
            tag::GET_REQUEST => Some(Self::Get),
            tag::GET_NEXT_REQUEST => Some(Self::GetNext),
            tag::SET_REQUEST => Some(Self::Set),
            tag::RESPONSE => Some(Self::Response),
            _ => None,
        }
    }
}

impl std::fmt::Display for PduKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GetRequest"),
            Self::GetNext => write!(f, "GetNextRequest"),
            Self::Set => write!(f, "SetRequest"),
            Self::Response => write!(f, "Response"),
        }
    }
}

/// Protocol data unit: one request or response.
#[derive(Debug, Clone)]
pub struct Pdu {
    pub kind: PduKind,
    /// Identifier replies are matched by. Assigned by the channel allocator.
    pub request_id: i32,
    /// 0 on success; RFC 3416 status code otherwise.
    pub error_status: i32,
    /// 1-based index of the varbind the status refers to.
    pub error_index: i32,
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    /// Build a GET request for the given keys.
    pub fn get(request_id: i32, oids: &[Oid]) -> Self {
        Self {
            kind: PduKind::Get,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().map(|oid| VarBind::null(oid.clone())).collect(),
        }
    }

    /// Build a GETNEXT request for the given keys.
    pub fn get_next(request_id: i32, oids: &[Oid]) -> Self {
        Self {
            kind: PduKind::GetNext,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().map(|oid| VarBind::null(oid.clone())).collect(),
        }
    }

    /// Build a SET request for the given bindings.
    pub fn set(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            kind: PduKind::Set,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// Build a response (used by test agents).
    pub fn response(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            kind: PduKind::Response,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// True if the agent reported a non-success status.
    pub fn is_error(&self) -> bool {
        self.error_status != 0
    }

    /// Encode this PDU into `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let mut content = Vec::with_capacity(16 + self.varbinds.len() * 24);
        push_integer(&mut content, self.request_id);
        push_integer(&mut content, self.error_status);
        push_integer(&mut content, self.error_index);
        encode_varbind_list(&mut content, &self.varbinds);
        push_tlv(out, self.kind.tag(), &content);
    }

    /// Decode a PDU from the decoder's current position.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let at = decoder.offset();
        let tag_byte = decoder.read_tag()?;
        let kind = PduKind::from_tag(tag_byte)
            .ok_or_else(|| Error::decode(at, DecodeErrorKind::UnknownPduType(tag_byte)))?;
        let len = decoder.read_length()?;
        let mut pdu = decoder.sub_decoder(len)?;

        let request_id = pdu.read_integer()?;
        let error_status = pdu.read_integer()?;
        let error_index = pdu.read_integer()?;
        let varbinds = decode_varbind_list(&mut pdu)?;

        Ok(Pdu {
            kind,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }
}

/// Encode a value TLV.
pub fn encode_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(v) => push_integer(out, *v),
        Value::OctetString(data) => push_tlv(out, tag::OCTET_STRING, data),
        Value::Null => push_null(out),
        Value::ObjectIdentifier(oid) => push_oid(out, oid),
        Value::IpAddress(addr) => push_tlv(out, tag::IP_ADDRESS, addr),
        Value::Counter32(v) => push_unsigned(out, tag::COUNTER32, *v as u64),
        Value::Gauge32(v) => push_unsigned(out, tag::GAUGE32, *v as u64),
        Value::TimeTicks(v) => push_unsigned(out, tag::TIMETICKS, *v as u64),
        Value::Opaque(data) => push_tlv(out, tag::OPAQUE, data),
        Value::Counter64(v) => push_unsigned(out, tag::COUNTER64, *v),
        Value::NoSuchObject => push_tlv(out, tag::NO_SUCH_OBJECT, &[]),
        Value::NoSuchInstance => push_tlv(out, tag::NO_SUCH_INSTANCE, &[]),
        Value::EndOfMibView => push_tlv(out, tag::END_OF_MIB_VIEW, &[]),
        Value::Unknown { tag, data } => push_tlv(out, *tag, data),
    }
}

/// Decode a value TLV.
pub fn decode_value(decoder: &mut Decoder) -> Result<Value> {
    let at = decoder.offset();
    let tag_byte = decoder.read_tag()?;
    let len = decoder.read_length()?;

    match tag_byte {
        tag::INTEGER => Ok(Value::Integer(decoder.read_integer_content(len)?)),
        tag::OCTET_STRING => Ok(Value::OctetString(decoder.read_bytes(len)?)),
        tag::NULL => {
            if len != 0 {
                return Err(Error::decode(at, DecodeErrorKind::InvalidNull));
            }
            Ok(Value::Null)
        }
        tag::OBJECT_IDENTIFIER => Ok(Value::ObjectIdentifier(decoder.read_oid_content(len)?)),
        tag::IP_ADDRESS => {
            if len != 4 {
                return Err(Error::decode(
                    at,
                    DecodeErrorKind::InvalidIpAddressLength { length: len },
                ));
            }
            let data = decoder.read_bytes(4)?;
            Ok(Value::IpAddress([data[0], data[1], data[2], data[3]]))
        }
        tag::COUNTER32 => Ok(Value::Counter32(decoder.read_unsigned32_content(len)?)),
        tag::GAUGE32 => Ok(Value::Gauge32(decoder.read_unsigned32_content(len)?)),
        tag::TIMETICKS => Ok(Value::TimeTicks(decoder.read_unsigned32_content(len)?)),
        tag::OPAQUE => Ok(Value::Opaque(decoder.read_bytes(len)?)),
        tag::COUNTER64 => Ok(Value::Counter64(decoder.read_unsigned64_content(len)?)),
        tag::NO_SUCH_OBJECT => {
            let _ = decoder.read_bytes(len)?;
            Ok(Value::NoSuchObject)
        }
        tag::NO_SUCH_INSTANCE => {
            let _ = decoder.read_bytes(len)?;
            Ok(Value::NoSuchInstance)
        }
        tag::END_OF_MIB_VIEW => {
            let _ = decoder.read_bytes(len)?;
            Ok(Value::EndOfMibView)
        }
        tag::OCTET_STRING_CONSTRUCTED => {
            Err(Error::decode(at, DecodeErrorKind::ConstructedOctetString))
        }
        other => {
            // Preserve unrecognized types verbatim.
            let data = decoder.read_bytes(len)?;
            Ok(Value::Unknown { tag: other, data })
        }
    }
}

/// Encode one varbind: `SEQUENCE { oid, value }`.
pub fn encode_varbind(out: &mut Vec<u8>, vb: &VarBind) {
    let mut content = Vec::with_capacity(24);
    push_oid(&mut content, &vb.oid);
    encode_value(&mut content, &vb.value);
    push_tlv(out, tag::SEQUENCE, &content);
}

/// Decode one varbind.
pub fn decode_varbind(decoder: &mut Decoder) -> Result<VarBind> {
    let mut seq = decoder.read_sequence()?;
    let oid = seq.read_oid()?;
    let value = decode_value(&mut seq)?;
    Ok(VarBind { oid, value })
}

/// Encode a varbind list: `SEQUENCE OF varbind`.
pub fn encode_varbind_list(out: &mut Vec<u8>, varbinds: &[VarBind]) {
    let mut content = Vec::with_capacity(varbinds.len() * 28);
    for vb in varbinds {
        encode_varbind(&mut content, vb);
    }
    push_tlv(out, tag::SEQUENCE, &content);
}

/// Decode a varbind list.
pub fn decode_varbind_list(decoder: &mut Decoder) -> Result<Vec<VarBind>> {
    let mut seq = decoder.read_sequence()?;
    // Typical varbind is 20-50 bytes; a conservative divisor avoids
    // both reallocation and over-allocation.
    let mut varbinds = Vec::with_capacity((seq.remaining() / 16).max(1));
    while !seq.is_empty() {
        varbinds.push(decode_varbind(&mut seq)?);
    }
    Ok(varbinds)
}

/// Encode a complete v2c message.
pub fn encode_message(community: &[u8], pdu: &Pdu) -> Bytes {
    let mut content = Vec::with_capacity(16 + community.len() + pdu.varbinds.len() * 28);
    push_integer(&mut content, VERSION_2C);
    push_tlv(&mut content, tag::OCTET_STRING, community);
    pdu.encode_into(&mut content);

    let mut out = Vec::with_capacity(content.len() + 4);
    push_tlv(&mut out, tag::SEQUENCE, &content);
    Bytes::from(out)
}

/// Decode a complete v2c message, returning `(community, pdu)`.
pub fn decode_message(data: Bytes) -> Result<(Bytes, Pdu)> {
    let mut decoder = Decoder::new(data);
    let mut msg = decoder.read_sequence()?;

    let at = msg.offset();
    let version = msg.read_integer()?;
    if version != VERSION_2C {
        return Err(Error::decode(at, DecodeErrorKind::UnknownVersion(version)));
    }
    let community = msg.read_octet_string()?;
    let pdu = Pdu::decode(&mut msg)?;
    Ok((community, pdu))
}

/// Extract the request identifier from an encoded message without a full
/// decode.
///
/// Used by the transport's receive loop to correlate (or drop) datagrams
/// before spending a full parse on them. Returns `None` for anything that
/// does not look like a v2c message carrying a PDU.
pub fn peek_request_id(data: &Bytes) -> Option<i32> {
    let mut decoder = Decoder::new(data.clone());
    let mut msg = decoder.read_sequence().ok()?;
    let _version = msg.read_integer().ok()?;
    let _community = msg.read_octet_string().ok()?;
    let tag_byte = msg.peek_tag()?;
    // Any context-class PDU tag carries a request id first.
    if !(0xA0..=0xA8).contains(&tag_byte) {
        return None;
    }
    let _ = msg.read_tag().ok()?;
    let len = msg.read_length().ok()?;
    let mut pdu = msg.sub_decoder(len).ok()?;
    pdu.read_integer().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn value_roundtrip(value: Value) -> Value {
        let mut out = Vec::new();
        encode_value(&mut out, &value);
        decode_value(&mut Decoder::from_slice(&out)).unwrap()
    }

    #[test]
    fn values_roundtrip() {
        let values = [
            Value::Integer(-42),
            Value::Integer(i32::MAX),
            Value::OctetString(Bytes::from_static(b"GigabitEthernet0/1")),
            Value::OctetString(Bytes::new()),
            Value::Null,
            Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 9)),
            Value::IpAddress([192, 0, 2, 1]),
            Value::Counter32(u32::MAX),
            Value::Gauge32(1_000_000_000),
            Value::TimeTicks(8_640_000),
            Value::Opaque(Bytes::from_static(&[0xDE, 0xAD])),
            Value::Counter64(u64::MAX),
            Value::NoSuchObject,
            Value::NoSuchInstance,
            Value::EndOfMibView,
        ];
        for value in values {
            assert_eq!(value_roundtrip(value.clone()), value, "{value:?}");
        }
    }

    #[test]
    fn unknown_tag_preserved() {
        let data = &[0x45u8, 0x03, 0x01, 0x02, 0x03];
        let value = decode_value(&mut Decoder::from_slice(data)).unwrap();
        match &value {
            Value::Unknown { tag, data } => {
                assert_eq!(*tag, 0x45);
                assert_eq!(data.as_ref(), &[0x01, 0x02, 0x03]);
            }
            other => panic!("expected Unknown, got {other:?}"),
        }
        assert_eq!(value_roundtrip(value.clone()), value);
    }

    #[test]
    fn constructed_octet_string_rejected() {
        let data = &[0x24u8, 0x03, 0x04, 0x01, 0x41];
        let err = decode_value(&mut Decoder::from_slice(data)).unwrap_err();
        assert!(matches!(
            *err,
            Error::Decode {
                kind: DecodeErrorKind::ConstructedOctetString,
                ..
            }
        ));
    }

    #[test]
    fn get_message_known_bytes() {
        // GET sysDescr.0, community "public", request id 1 - the canonical
        // 40-byte v2c request.
        let pdu = Pdu::get(1, &[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)]);
        let encoded = encode_message(b"public", &pdu);
        let expected: &[u8] = &[
            0x30, 0x26, 0x02, 0x01, 0x01, 0x04, 0x06, 0x70, 0x75, 0x62, 0x6C, 0x69, 0x63, 0xA0,
            0x19, 0x02, 0x01, 0x01, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0E, 0x30, 0x0C,
            0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, 0x05, 0x00,
        ];
        assert_eq!(encoded.as_ref(), expected);
    }

    #[test]
    fn message_roundtrip() {
        let pdu = Pdu::set(
            7421,
            vec![
                VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("edge-r2")),
                VarBind::new(
                    oid!(1, 3, 6, 1, 2, 1, 14, 8, 1, 4, 10, 0, 0, 1, 0, 0),
                    Value::Integer(20),
                ),
            ],
        );
        let encoded = encode_message(b"private", &pdu);
        let (community, decoded) = decode_message(encoded).unwrap();

        assert_eq!(community.as_ref(), b"private");
        assert_eq!(decoded.kind, PduKind::Set);
        assert_eq!(decoded.request_id, 7421);
        assert_eq!(decoded.error_status, 0);
        assert_eq!(decoded.varbinds.len(), 2);
        assert_eq!(decoded.varbinds[0].value.as_str(), Some("edge-r2"));
    }

    #[test]
    fn error_response_roundtrip() {
        let mut pdu = Pdu::response(99, vec![VarBind::null(oid!(1, 3, 6, 1))]);
        pdu.error_status = 3;
        pdu.error_index = 1;
        let (_, decoded) = decode_message(encode_message(b"public", &pdu)).unwrap();
        assert!(decoded.is_error());
        assert_eq!(decoded.error_status, 3);
        assert_eq!(decoded.error_index, 1);
    }

    #[test]
    fn rejects_wrong_version() {
        // Same canonical GET but with version 0 (v1).
        let pdu = Pdu::get(1, &[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)]);
        let mut bytes = encode_message(b"public", &pdu).to_vec();
        bytes[4] = 0x00;
        let err = decode_message(Bytes::from(bytes)).unwrap_err();
        assert!(matches!(
            *err,
            Error::Decode {
                kind: DecodeErrorKind::UnknownVersion(0),
                ..
            }
        ));
    }

    #[test]
    fn peek_matches_full_decode() {
        for id in [0, 1, 127, 128, 0x1234, i32::MAX] {
            let pdu = Pdu::get(id, &[oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)]);
            let encoded = encode_message(b"public", &pdu);
            assert_eq!(peek_request_id(&encoded), Some(id), "id {id}");
        }
    }

    #[test]
    fn peek_rejects_garbage() {
        assert_eq!(peek_request_id(&Bytes::new()), None);
        assert_eq!(peek_request_id(&Bytes::from_static(&[0x30, 0x02])), None);
        assert_eq!(
            peek_request_id(&Bytes::from_static(&[0x02, 0x01, 0x00])),
            None
        );
    }

    #[test]
    fn empty_varbind_list_roundtrip() {
        let pdu = Pdu::response(5, Vec::new());
        let (_, decoded) = decode_message(encode_message(b"public", &pdu)).unwrap();
        assert!(decoded.varbinds.is_empty());
    }
}
