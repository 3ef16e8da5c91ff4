use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde_json::{Map, Value};

use crate::error::{Result, WireError};

/// Length prefix: one little-endian u16.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Largest JSON section the length prefix can describe.
pub const MAX_JSON_LEN: usize = u16::MAX as usize;

/// Default cap on a trailing binary payload: 16 MiB.
pub const DEFAULT_MAX_DATA_SIZE: usize = 16 * 1024 * 1024;

/// JSON field naming the message type.
pub const TYPE_FIELD: &str = "type";

/// JSON field declaring the trailing binary payload length.
pub const DATA_SIZE_FIELD: &str = "dataSize";

/// A decoded wire message.
///
/// `fields` holds every JSON field except `type` (and `dataSize` when it was
/// consumed to attach `binary`). `binary` is a slice of the buffer the
/// message was decoded from, not a copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub msg_type: String,
    pub fields: Map<String, Value>,
    pub binary: Option<Bytes>,
}

impl Message {
    /// Create a message with no fields.
    pub fn new(msg_type: impl Into<String>) -> Self {
        Self::with_fields(msg_type, Map::new())
    }

    /// Create a message from an existing field map.
    pub fn with_fields(msg_type: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            msg_type: msg_type.into(),
            fields,
            binary: None,
        }
    }

    /// Create a message from a JSON value, which must be an object or null.
    pub fn from_value(msg_type: impl Into<String>, value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self::with_fields(msg_type, fields)),
            Value::Null => Ok(Self::new(msg_type)),
            _ => Err(WireError::NotAnObject),
        }
    }

    /// Builder: set one field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Builder: attach a binary payload.
    pub fn with_binary(mut self, data: impl Into<Bytes>) -> Self {
        self.binary = Some(data.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Numeric field as `f64`.
    pub fn f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    /// Non-negative integer field.
    pub fn u64(&self, key: &str) -> Option<u64> {
        self.fields.get(key).and_then(Value::as_u64)
    }

    /// String field.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// The full JSON object as sent on the wire.
    ///
    /// `dataSize` always describes `binary`: it is set from the payload length,
    /// and a numeric `dataSize` field is dropped when there is no payload.
    pub fn to_json(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert(TYPE_FIELD.to_string(), Value::String(self.msg_type.clone()));
        match &self.binary {
            Some(binary) => {
                object.insert(DATA_SIZE_FIELD.to_string(), Value::from(binary.len()));
            }
            None => {
                if matches!(object.get(DATA_SIZE_FIELD), Some(Value::Number(_))) {
                    object.remove(DATA_SIZE_FIELD);
                }
            }
        }
        Value::Object(object)
    }
}

/// Encode a message into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬──────────────────────┬──────────────────────┐
/// │ Length N   │ JSON (N bytes UTF-8) │ Binary (dataSize B)  │
/// │ (2B LE)    │ {"type": .., ...}    │ optional             │
/// └────────────┴──────────────────────┴──────────────────────┘
/// ```
///
/// Fails with [`WireError::MessageTooLarge`] when the JSON exceeds
/// [`MAX_JSON_LEN`]; `dst` is left untouched in that case.
pub fn encode_message(message: &Message, dst: &mut BytesMut) -> Result<()> {
    let json = serde_json::to_vec(&message.to_json())?;
    if json.len() > MAX_JSON_LEN {
        return Err(WireError::MessageTooLarge {
            size: json.len(),
            max: MAX_JSON_LEN,
        });
    }

    let binary_len = message.binary.as_ref().map_or(0, Bytes::len);
    dst.reserve(LENGTH_PREFIX_SIZE + json.len() + binary_len);
    dst.put_u16_le(json.len() as u16);
    dst.put_slice(&json);
    if let Some(binary) = &message.binary {
        dst.put_slice(binary);
    }
    Ok(())
}

/// Decode every message packed into one physical buffer.
///
/// Fails on the first malformed message; messages before it are lost with
/// it. Use [`MessageIter`] to keep the ones decoded before the failure.
pub fn decode_buffer(buf: Bytes) -> Result<Vec<Message>> {
    MessageIter::new(buf).collect()
}

/// Iterates over the messages packed into one physical buffer.
///
/// Stops after the first error. The offset never moves past the end of the
/// buffer.
#[derive(Debug)]
pub struct MessageIter {
    buf: Bytes,
    offset: usize,
    failed: bool,
}

impl MessageIter {
    pub fn new(buf: Bytes) -> Self {
        Self {
            buf,
            offset: 0,
            failed: false,
        }
    }

    /// Bytes consumed by successfully decoded messages.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn next_message(&mut self) -> Result<Message> {
        let remaining = self.buf.len() - self.offset;
        if remaining < LENGTH_PREFIX_SIZE {
            return Err(WireError::MalformedHeader {
                declared: LENGTH_PREFIX_SIZE,
                remaining,
            });
        }

        let json_start = self.offset + LENGTH_PREFIX_SIZE;
        let json_len = u16::from_le_bytes([self.buf[self.offset], self.buf[self.offset + 1]]) as usize;
        let after_prefix = remaining - LENGTH_PREFIX_SIZE;
        if json_len > after_prefix {
            return Err(WireError::MalformedHeader {
                declared: json_len,
                remaining: after_prefix,
            });
        }

        let json_end = json_start + json_len;
        let object = parse_object(&self.buf[json_start..json_end])?;
        let data_size = declared_data_size(&object)?;

        let binary = match data_size {
            Some(size) => {
                let after_json = self.buf.len() - json_end;
                if size > after_json {
                    return Err(WireError::MalformedHeader {
                        declared: size,
                        remaining: after_json,
                    });
                }
                Some(self.buf.slice(json_end..json_end + size))
            }
            None => None,
        };

        let consumed_to = json_end + binary.as_ref().map_or(0, Bytes::len);
        let message = into_message(object, binary)?;
        self.offset = consumed_to;
        Ok(message)
    }
}

impl Iterator for MessageIter {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.buf.len() {
            return None;
        }
        let result = self.next_message();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

/// Decode one message from a growing stream buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete message yet.
/// On success, consumes the message bytes from the buffer. A message whose
/// JSON is rejected is consumed too, so the next call starts at the next
/// length prefix.
pub fn decode_message(src: &mut BytesMut, max_data_size: usize) -> Result<Option<Message>> {
    if src.len() < LENGTH_PREFIX_SIZE {
        return Ok(None); // Need more data
    }

    let json_len = u16::from_le_bytes([src[0], src[1]]) as usize;
    let json_end = LENGTH_PREFIX_SIZE + json_len;
    if src.len() < json_end {
        return Ok(None); // Need more data
    }

    let header = parse_object(&src[LENGTH_PREFIX_SIZE..json_end])
        .and_then(|object| declared_data_size(&object).map(|size| (object, size)));
    let (object, data_size) = match header {
        Ok(parsed) => parsed,
        Err(err) => {
            src.advance(json_end);
            return Err(err);
        }
    };

    if let Some(size) = data_size {
        if size > max_data_size {
            src.advance(json_end);
            return Err(WireError::MessageTooLarge {
                size,
                max: max_data_size,
            });
        }
    }

    let total = json_end + data_size.unwrap_or(0);
    if src.len() < total {
        return Ok(None); // Need more data
    }

    let frame = src.split_to(total).freeze();
    let binary = data_size.map(|_| frame.slice(json_end..));
    into_message(object, binary).map(Some)
}

/// Configuration for message readers and writers.
#[derive(Debug, Clone)]
pub struct WireConfig {
    /// Largest accepted trailing binary payload. Default: 16 MiB.
    pub max_data_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            max_data_size: DEFAULT_MAX_DATA_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

fn parse_object(json: &[u8]) -> Result<Map<String, Value>> {
    match serde_json::from_slice::<Value>(json)? {
        Value::Object(object) => Ok(object),
        _ => Err(WireError::NotAnObject),
    }
}

fn declared_data_size(object: &Map<String, Value>) -> Result<Option<usize>> {
    match object.get(DATA_SIZE_FIELD) {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(size) => Ok(Some(size as usize)),
            None => Err(WireError::InvalidDataSize(n.clone())),
        },
        _ => Ok(None),
    }
}

fn into_message(mut object: Map<String, Value>, binary: Option<Bytes>) -> Result<Message> {
    let msg_type = match object.remove(TYPE_FIELD) {
        Some(Value::String(msg_type)) => msg_type,
        _ => return Err(WireError::MissingType),
    };
    if binary.is_some() {
        object.remove(DATA_SIZE_FIELD);
    }
    Ok(Message {
        msg_type,
        fields: object,
        binary,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn encoded(messages: &[Message]) -> BytesMut {
        let mut buf = BytesMut::new();
        for message in messages {
            encode_message(message, &mut buf).unwrap();
        }
        buf
    }

    fn raw_frame(json: &[u8], trailer: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u16_le(json.len() as u16);
        buf.put_slice(json);
        buf.put_slice(trailer);
        buf
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let message = Message::new("monitoring.frame")
            .field("t", 1.5)
            .field("dt", 0.016)
            .field("tags", json!(["a", "b"]));

        let buf = encoded(&[message.clone()]);
        let decoded = decode_buffer(buf.freeze()).unwrap();

        assert_eq!(decoded, vec![message]);
    }

    #[test]
    fn test_wire_layout() {
        let buf = encoded(&[Message::new("x")]);
        let json = br#"{"type":"x"}"#;

        assert_eq!(&buf[..2], &(json.len() as u16).to_le_bytes());
        assert_eq!(&buf[2..], json);
    }

    #[test]
    fn test_multiple_messages_in_one_buffer() {
        let buf = encoded(&[
            Message::new("first").field("n", 1),
            Message::new("second").field("n", 2),
            Message::new("third"),
        ]);

        let decoded = decode_buffer(buf.freeze()).unwrap();
        let types: Vec<&str> = decoded.iter().map(|m| m.msg_type.as_str()).collect();
        assert_eq!(types, ["first", "second", "third"]);
        assert_eq!(decoded[1].u64("n"), Some(2));
    }

    #[test]
    fn test_binary_payload_is_sliced_not_copied() {
        let buf = raw_frame(br#"{"type":"blob","dataSize":4}"#, b"\x01\x02\x03\x04");
        let frozen = buf.freeze();
        let base = frozen.as_ptr() as usize;

        let decoded = decode_buffer(frozen.clone()).unwrap();
        let binary = decoded[0].binary.as_ref().unwrap();

        assert_eq!(binary.as_ref(), b"\x01\x02\x03\x04");
        let start = binary.as_ptr() as usize;
        assert!(start >= base && start + binary.len() <= base + frozen.len());
        assert!(decoded[0].get(DATA_SIZE_FIELD).is_none());
    }

    #[test]
    fn test_binary_followed_by_json_message() {
        let mut buf = raw_frame(br#"{"type":"blob","dataSize":3}"#, b"abc");
        encode_message(&Message::new("after"), &mut buf).unwrap();

        let decoded = decode_buffer(buf.freeze()).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].binary.as_deref(), Some(&b"abc"[..]));
        assert_eq!(decoded[1].msg_type, "after");
    }

    #[test]
    fn test_binary_roundtrip_reinjects_data_size() {
        let message = Message::new("blob").with_binary(Bytes::from_static(b"payload"));
        let buf = encoded(&[message.clone()]);

        let decoded = decode_buffer(buf.freeze()).unwrap();
        assert_eq!(decoded, vec![message]);
    }

    #[test]
    fn test_stray_data_size_without_binary_keeps_framing() {
        let stray = Message::new("x").field(DATA_SIZE_FIELD, 3).field("keep", 1);
        let buf = encoded(&[stray, Message::new("next")]);

        let decoded = decode_buffer(buf.freeze()).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0], Message::new("x").field("keep", 1));
        assert_eq!(decoded[1], Message::new("next"));
    }

    #[test]
    fn test_non_numeric_data_size_survives_encoding() {
        let message = Message::new("x").field(DATA_SIZE_FIELD, "12");
        let decoded = decode_buffer(encoded(&[message.clone()]).freeze()).unwrap();
        assert_eq!(decoded, vec![message]);
    }

    #[test]
    fn test_non_numeric_data_size_is_a_plain_field() {
        let buf = raw_frame(br#"{"type":"x","dataSize":"12"}"#, b"");
        let decoded = decode_buffer(buf.freeze()).unwrap();

        assert!(decoded[0].binary.is_none());
        assert_eq!(decoded[0].str(DATA_SIZE_FIELD), Some("12"));
    }

    #[test]
    fn test_length_exceeding_buffer_is_malformed() {
        let mut buf = BytesMut::new();
        buf.put_u16_le(50);
        buf.put_slice(br#"{"type":"x"}"#);

        let mut iter = MessageIter::new(buf.freeze());
        let err = iter.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            WireError::MalformedHeader {
                declared: 50,
                remaining: 12
            }
        ));
        assert_eq!(iter.offset(), 0);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_malformed_after_valid_keeps_offset_at_boundary() {
        let mut buf = encoded(&[Message::new("ok")]);
        let boundary = buf.len();
        buf.put_u16_le(9000);

        let mut iter = MessageIter::new(buf.freeze());
        assert_eq!(iter.next().unwrap().unwrap().msg_type, "ok");
        assert!(matches!(
            iter.next().unwrap(),
            Err(WireError::MalformedHeader { .. })
        ));
        assert_eq!(iter.offset(), boundary);
    }

    #[test]
    fn test_data_size_exceeding_buffer_is_malformed() {
        let buf = raw_frame(br#"{"type":"blob","dataSize":10}"#, b"abc");
        let err = decode_buffer(buf.freeze()).unwrap_err();
        assert!(matches!(
            err,
            WireError::MalformedHeader {
                declared: 10,
                remaining: 3
            }
        ));
    }

    #[test]
    fn test_truncated_length_prefix_is_malformed() {
        let err = decode_buffer(Bytes::from_static(&[0x05])).unwrap_err();
        assert!(matches!(err, WireError::MalformedHeader { declared: 2, .. }));
    }

    #[test]
    fn test_empty_buffer_decodes_to_nothing() {
        assert!(decode_buffer(Bytes::new()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_type_and_non_object() {
        let err = decode_buffer(raw_frame(br#"{"t":1}"#, b"").freeze()).unwrap_err();
        assert!(matches!(err, WireError::MissingType));

        let err = decode_buffer(raw_frame(br#"{"type":7}"#, b"").freeze()).unwrap_err();
        assert!(matches!(err, WireError::MissingType));

        let err = decode_buffer(raw_frame(b"[1,2]", b"").freeze()).unwrap_err();
        assert!(matches!(err, WireError::NotAnObject));

        let err = decode_buffer(raw_frame(b"{nope", b"").freeze()).unwrap_err();
        assert!(matches!(err, WireError::InvalidJson(_)));
    }

    #[test]
    fn test_negative_data_size_is_rejected() {
        let err = decode_buffer(raw_frame(br#"{"type":"x","dataSize":-1}"#, b"").freeze())
            .unwrap_err();
        assert!(matches!(err, WireError::InvalidDataSize(_)));
    }

    #[test]
    fn test_encode_rejects_oversized_json_without_writing() {
        let message = Message::new("big").field("blob", "x".repeat(70_000));
        let mut dst = BytesMut::from(&b"keep"[..]);

        let err = encode_message(&message, &mut dst).unwrap_err();
        assert!(matches!(
            err,
            WireError::MessageTooLarge { max: MAX_JSON_LEN, .. }
        ));
        assert_eq!(dst.as_ref(), b"keep");
    }

    #[test]
    fn test_encode_accepts_exactly_max_json_len() {
        // {"pad":"<k>","type":"t"} is 21 bytes plus the padding.
        let message = Message::new("t").field("pad", "x".repeat(MAX_JSON_LEN - 21));
        let mut dst = BytesMut::new();

        encode_message(&message, &mut dst).unwrap();
        assert_eq!(dst.len(), LENGTH_PREFIX_SIZE + MAX_JSON_LEN);
        assert_eq!(&dst[..2], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_type_field_overrides_colliding_field() {
        let message = Message::new("real").field("type", "spoofed");
        let decoded = decode_buffer(encoded(&[message]).freeze()).unwrap();
        assert_eq!(decoded[0].msg_type, "real");
    }

    #[test]
    fn test_from_value() {
        let message = Message::from_value("x", json!({"key": "k"})).unwrap();
        assert_eq!(message.str("key"), Some("k"));
        assert!(Message::from_value("x", json!(null)).unwrap().fields.is_empty());
        assert!(matches!(
            Message::from_value("x", json!(3)),
            Err(WireError::NotAnObject)
        ));
    }

    #[test]
    fn test_stream_decode_incomplete() {
        let full = encoded(&[Message::new("slow").field("n", 1)]);

        let mut partial = BytesMut::from(&full[..1]);
        assert!(decode_message(&mut partial, DEFAULT_MAX_DATA_SIZE)
            .unwrap()
            .is_none());

        let mut partial = BytesMut::from(&full[..full.len() - 1]);
        assert!(decode_message(&mut partial, DEFAULT_MAX_DATA_SIZE)
            .unwrap()
            .is_none());
        assert_eq!(partial.len(), full.len() - 1);
    }

    #[test]
    fn test_stream_decode_waits_for_binary() {
        let full = raw_frame(br#"{"type":"blob","dataSize":4}"#, b"wxyz");
        let mut partial = BytesMut::from(&full[..full.len() - 2]);

        assert!(decode_message(&mut partial, DEFAULT_MAX_DATA_SIZE)
            .unwrap()
            .is_none());

        partial.extend_from_slice(&full[full.len() - 2..]);
        let message = decode_message(&mut partial, DEFAULT_MAX_DATA_SIZE)
            .unwrap()
            .unwrap();
        assert_eq!(message.binary.as_deref(), Some(&b"wxyz"[..]));
        assert!(partial.is_empty());
    }

    #[test]
    fn test_stream_decode_skips_bad_json_and_continues() {
        let mut buf = raw_frame(b"{broken", b"");
        encode_message(&Message::new("next"), &mut buf).unwrap();

        let err = decode_message(&mut buf, DEFAULT_MAX_DATA_SIZE).unwrap_err();
        assert!(matches!(err, WireError::InvalidJson(_)));

        let message = decode_message(&mut buf, DEFAULT_MAX_DATA_SIZE)
            .unwrap()
            .unwrap();
        assert_eq!(message.msg_type, "next");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_stream_decode_rejects_oversized_data() {
        let mut buf = raw_frame(br#"{"type":"blob","dataSize":1024}"#, b"");
        let err = decode_message(&mut buf, 16).unwrap_err();
        assert!(matches!(
            err,
            WireError::MessageTooLarge {
                size: 1024,
                max: 16
            }
        ));
    }
}
