//! Binary codec for stored records.
//!
//! All integers on the wire are big-endian so lexicographic byte order
//! matches numeric order, the property every prefix scan in this crate
//! relies on. Signed 64-bit values are stored as their two's-complement
//! bit pattern (property values are never key-ordered, so this is safe);
//! doubles are stored as their IEEE-754 bits emitted big-endian.
//!
//! Layouts:
//!
//! | Record      | Bytes                                                  |
//! |-------------|--------------------------------------------------------|
//! | value       | tag u8, then payload (see [`Value`])                   |
//! | property    | key u32, value                                         |
//! | label set   | count u32, count × u32                                 |
//! | node header | id u64, label set, hot count u32, hot properties       |
//! | edge ref    | id u64, src u64, dst u64 (exactly 24 bytes)            |
//!
//! Vector payloads are the one exception to big-endian: they are raw
//! little-endian float32 arrays, fixed at this boundary so the on-disk
//! format is defined on every host.

use crate::error::StoreError;
use crate::model::{EdgeRef, NodeHeader, Property, Value};

const TAG_I64: u8 = 0;
const TAG_F64: u8 = 1;
const TAG_BOOL: u8 = 2;
const TAG_TEXT_ID: u8 = 3;
const TAG_BYTES: u8 = 4;
const TAG_NULL: u8 = 5;

// ─────────────────────────────────────────────
// Primitives
// ─────────────────────────────────────────────

#[inline]
pub(crate) fn put_u64(out: &mut Vec<u8>, x: u64) {
    out.extend_from_slice(&x.to_be_bytes());
}

#[inline]
pub(crate) fn put_u32(out: &mut Vec<u8>, x: u32) {
    out.extend_from_slice(&x.to_be_bytes());
}

/// Split `n` bytes off the front of `input`, or fail with a corrupt error.
#[inline]
fn take<'a>(input: &mut &'a [u8], n: usize, what: &'static str) -> Result<&'a [u8], StoreError> {
    if input.len() < n {
        return Err(StoreError::Corrupt(what));
    }
    let (head, rest) = input.split_at(n);
    *input = rest;
    Ok(head)
}

#[inline]
fn take_u64(input: &mut &[u8], what: &'static str) -> Result<u64, StoreError> {
    let b = take(input, 8, what)?;
    Ok(u64::from_be_bytes(b.try_into().expect("length checked")))
}

#[inline]
fn take_u32(input: &mut &[u8], what: &'static str) -> Result<u32, StoreError> {
    let b = take(input, 4, what)?;
    Ok(u32::from_be_bytes(b.try_into().expect("length checked")))
}

// ─────────────────────────────────────────────
// Value
// ─────────────────────────────────────────────

pub fn encode_value(out: &mut Vec<u8>, v: &Value) {
    match v {
        Value::I64(x) => {
            out.push(TAG_I64);
            put_u64(out, *x as u64);
        }
        Value::F64(d) => {
            out.push(TAG_F64);
            put_u64(out, d.to_bits());
        }
        Value::Bool(b) => {
            out.push(TAG_BOOL);
            out.push(u8::from(*b));
        }
        Value::TextId(id) => {
            out.push(TAG_TEXT_ID);
            put_u32(out, *id);
        }
        Value::Bytes(bytes) => {
            out.push(TAG_BYTES);
            put_u32(out, bytes.len() as u32);
            out.extend_from_slice(bytes);
        }
        Value::Null => out.push(TAG_NULL),
    }
}

pub fn decode_value(input: &mut &[u8]) -> Result<Value, StoreError> {
    let tag = take(input, 1, "value tag missing")?[0];
    match tag {
        TAG_I64 => Ok(Value::I64(take_u64(input, "i64 payload truncated")? as i64)),
        TAG_F64 => Ok(Value::F64(f64::from_bits(take_u64(
            input,
            "f64 payload truncated",
        )?))),
        TAG_BOOL => Ok(Value::Bool(take(input, 1, "bool payload truncated")?[0] != 0)),
        TAG_TEXT_ID => Ok(Value::TextId(take_u32(input, "text id truncated")?)),
        TAG_BYTES => {
            let len = take_u32(input, "bytes length truncated")? as usize;
            let payload = take(input, len, "bytes payload truncated")?;
            Ok(Value::Bytes(payload.to_vec()))
        }
        TAG_NULL => Ok(Value::Null),
        _ => Err(StoreError::Corrupt("unknown value tag")),
    }
}

/// Decode a value that occupies an entire stored row.
pub fn decode_value_all(mut bytes: &[u8]) -> Result<Value, StoreError> {
    let v = decode_value(&mut bytes)?;
    if !bytes.is_empty() {
        return Err(StoreError::Corrupt("trailing data after value"));
    }
    Ok(v)
}

// ─────────────────────────────────────────────
// Property / label set
// ─────────────────────────────────────────────

pub fn encode_property(out: &mut Vec<u8>, p: &Property) {
    put_u32(out, p.key_id);
    encode_value(out, &p.value);
}

pub fn decode_property(input: &mut &[u8]) -> Result<Property, StoreError> {
    let key_id = take_u32(input, "property key truncated")?;
    let value = decode_value(input)?;
    Ok(Property { key_id, value })
}

pub fn encode_label_set(out: &mut Vec<u8>, labels: &[u32]) {
    put_u32(out, labels.len() as u32);
    for id in labels {
        put_u32(out, *id);
    }
}

pub fn decode_label_set(input: &mut &[u8]) -> Result<Vec<u32>, StoreError> {
    let n = take_u32(input, "label count truncated")? as usize;
    let mut labels = Vec::with_capacity(n.min(1024));
    for _ in 0..n {
        labels.push(take_u32(input, "label id truncated")?);
    }
    Ok(labels)
}

// ─────────────────────────────────────────────
// Node header
// ─────────────────────────────────────────────

pub fn encode_node_header(h: &NodeHeader) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + 4 + h.labels.len() * 4 + 4 + h.hot_props.len() * 16);
    put_u64(&mut out, h.id);
    encode_label_set(&mut out, &h.labels);
    put_u32(&mut out, h.hot_props.len() as u32);
    for p in &h.hot_props {
        encode_property(&mut out, p);
    }
    out
}

pub fn decode_node_header(mut bytes: &[u8]) -> Result<NodeHeader, StoreError> {
    let input = &mut bytes;
    let id = take_u64(input, "node header id truncated")?;
    let labels = decode_label_set(input)?;
    let n = take_u32(input, "hot prop count truncated")? as usize;
    let mut hot_props = Vec::with_capacity(n.min(1024));
    for _ in 0..n {
        hot_props.push(decode_property(input)?);
    }
    if !input.is_empty() {
        return Err(StoreError::Corrupt("trailing data in node header"));
    }
    Ok(NodeHeader { id, labels, hot_props })
}

// ─────────────────────────────────────────────
// Edge ref
// ─────────────────────────────────────────────

pub fn encode_edge_ref(r: &EdgeRef) -> [u8; 24] {
    let mut out = [0u8; 24];
    out[0..8].copy_from_slice(&r.id.to_be_bytes());
    out[8..16].copy_from_slice(&r.src.to_be_bytes());
    out[16..24].copy_from_slice(&r.dst.to_be_bytes());
    out
}

pub fn decode_edge_ref(bytes: &[u8]) -> Result<EdgeRef, StoreError> {
    if bytes.len() != 24 {
        return Err(StoreError::Corrupt("edge ref is not 24 bytes"));
    }
    Ok(EdgeRef {
        id: u64::from_be_bytes(bytes[0..8].try_into().expect("length checked")),
        src: u64::from_be_bytes(bytes[8..16].try_into().expect("length checked")),
        dst: u64::from_be_bytes(bytes[16..24].try_into().expect("length checked")),
    })
}

// ─────────────────────────────────────────────
// Vector payloads
// ─────────────────────────────────────────────

/// Encode float32 coordinates as the little-endian vector payload.
pub fn floats_to_bytes(coords: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(coords.len() * 4);
    for c in coords {
        out.extend_from_slice(&c.to_le_bytes());
    }
    out
}

/// Decode a vector payload back into float32 coordinates.
///
/// Fails when the length is not a multiple of four.
pub fn bytes_to_floats(bytes: &[u8]) -> Result<Vec<f32>, StoreError> {
    if bytes.len() % 4 != 0 {
        return Err(StoreError::Corrupt("vector payload not a multiple of 4 bytes"));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes(c.try_into().expect("chunks are 4 bytes")))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_value(v: Value) {
        let mut buf = Vec::new();
        encode_value(&mut buf, &v);
        let decoded = decode_value_all(&buf).unwrap();
        assert_eq!(decoded, v);
    }

    #[test]
    fn value_roundtrips() {
        roundtrip_value(Value::I64(-42));
        roundtrip_value(Value::I64(i64::MIN));
        roundtrip_value(Value::F64(3.14159));
        roundtrip_value(Value::F64(-0.0));
        roundtrip_value(Value::Bool(true));
        roundtrip_value(Value::Bool(false));
        roundtrip_value(Value::TextId(7));
        roundtrip_value(Value::Bytes(b"hello".to_vec()));
        roundtrip_value(Value::Bytes(Vec::new()));
        roundtrip_value(Value::Null);
    }

    #[test]
    fn value_encoding_is_tagged_big_endian() {
        let mut buf = Vec::new();
        encode_value(&mut buf, &Value::I64(1));
        assert_eq!(buf, [0, 0, 0, 0, 0, 0, 0, 0, 1]);

        buf.clear();
        encode_value(&mut buf, &Value::TextId(0x0102_0304));
        assert_eq!(buf, [3, 1, 2, 3, 4]);

        buf.clear();
        encode_value(&mut buf, &Value::Null);
        assert_eq!(buf, [5]);
    }

    #[test]
    fn truncated_values_are_corrupt() {
        assert!(matches!(
            decode_value_all(&[0, 1, 2]),
            Err(StoreError::Corrupt(_))
        ));
        // bytes length prefix claims more than remains
        assert!(matches!(
            decode_value_all(&[4, 0, 0, 0, 10, b'x']),
            Err(StoreError::Corrupt(_))
        ));
        // unknown tag
        assert!(matches!(
            decode_value_all(&[9]),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn node_header_roundtrips() {
        let h = NodeHeader {
            id: 99,
            labels: vec![1, 5, 9],
            hot_props: vec![
                Property::new(2, Value::I64(7)),
                Property::new(4, Value::Bytes(b"blob".to_vec())),
            ],
        };
        let encoded = encode_node_header(&h);
        assert_eq!(decode_node_header(&encoded).unwrap(), h);
    }

    #[test]
    fn node_header_rejects_trailing_bytes() {
        let h = NodeHeader { id: 1, labels: vec![], hot_props: vec![] };
        let mut encoded = encode_node_header(&h);
        encoded.push(0);
        assert!(matches!(
            decode_node_header(&encoded),
            Err(StoreError::Corrupt("trailing data in node header"))
        ));
    }

    #[test]
    fn edge_ref_is_exactly_24_bytes() {
        let r = EdgeRef { id: 1, src: 2, dst: 3 };
        let encoded = encode_edge_ref(&r);
        assert_eq!(encoded.len(), 24);
        assert_eq!(decode_edge_ref(&encoded).unwrap(), r);
        assert!(decode_edge_ref(&encoded[..23]).is_err());
    }

    #[test]
    fn float_payload_roundtrips() {
        let coords = vec![0.0f32, -1.5, 3.25];
        let bytes = floats_to_bytes(&coords);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_floats(&bytes).unwrap(), coords);
        assert!(bytes_to_floats(&bytes[..5]).is_err());
    }
}
