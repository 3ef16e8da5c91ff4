//! `tokio_util::codec` adapter for async byte streams.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_message, encode_message, Message, DEFAULT_MAX_DATA_SIZE};
use crate::error::WireError;

/// Frames a byte stream into [`Message`] values.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    max_data_size: usize,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self::with_max_data_size(DEFAULT_MAX_DATA_SIZE)
    }

    pub fn with_max_data_size(max_data_size: usize) -> Self {
        Self { max_data_size }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, WireError> {
        decode_message(src, self.max_data_size)
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = WireError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), WireError> {
        encode_message(&item, dst)
    }
}

impl Encoder<&Message> for MessageCodec {
    type Error = WireError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<(), WireError> {
        encode_message(item, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_decodes_across_split_input() {
        let mut codec = MessageCodec::new();
        let mut encoded = BytesMut::new();
        codec
            .encode(Message::new("profiling.task").field("frame", 3), &mut encoded)
            .unwrap();

        let mut src = BytesMut::from(&encoded[..4]);
        assert!(codec.decode(&mut src).unwrap().is_none());

        src.extend_from_slice(&encoded[4..]);
        let message = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(message.msg_type, "profiling.task");
        assert_eq!(message.u64("frame"), Some(3));
        assert!(src.is_empty());
    }

    #[test]
    fn codec_encodes_by_reference() {
        let mut codec = MessageCodec::default();
        let message = Message::new("input.keyup").field("key", 13);
        let mut dst = BytesMut::new();

        codec.encode(&message, &mut dst).unwrap();
        let decoded = codec.decode(&mut dst).unwrap().unwrap();
        assert_eq!(decoded, message);
    }

    #[tokio::test]
    async fn framed_duplex_carries_binary_payloads() {
        use futures_util::{SinkExt, StreamExt};
        use tokio_util::codec::Framed;

        let (left, right) = tokio::io::duplex(4096);
        let mut producer = Framed::new(left, MessageCodec::new());
        let mut consumer = Framed::new(right, MessageCodec::new());

        producer
            .send(Message::new("monitoring.frame").field("t", 1.5).field("dt", 0.016))
            .await
            .unwrap();
        producer
            .send(
                Message::new("monitoring.memory")
                    .field("name", "heap")
                    .with_binary(vec![7u8; 100]),
            )
            .await
            .unwrap();

        let frame = consumer.next().await.unwrap().unwrap();
        assert_eq!(frame.msg_type, "monitoring.frame");
        assert_eq!(frame.f64("dt"), Some(0.016));

        let memory = consumer.next().await.unwrap().unwrap();
        assert_eq!(memory.str("name"), Some("heap"));
        assert_eq!(memory.binary.as_deref(), Some(&[7u8; 100][..]));
    }
}
