use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::{CHECKSUM_LENGTH, MAGIC, MAGIC_LENGTH, MESSAGE_LENGTH_LENGTH};

/// Computes the IEEE CRC32 checksum of a message payload.
///
/// The checksum stored in a message header covers the payload bytes only,
/// never the magic byte or the length field.
pub fn compute_checksum(payload: &[u8]) -> u32 {
    crc32fast::hash(payload)
}

/// A single message bound for a topic-partition.
///
/// A message owns an opaque payload; the magic byte and checksum are
/// produced at encoding time. Text payloads are converted to bytes at
/// this boundary via the `From` impls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    payload: Bytes,
}

impl Message {
    pub fn new(payload: impl Into<Bytes>) -> Message {
        Message {
            payload: payload.into(),
        }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Checksum of the payload as it will appear on the wire.
    pub fn checksum(&self) -> u32 {
        compute_checksum(&self.payload)
    }

    /// Bytes covered by the message length field (magic, checksum and
    /// payload).
    pub fn size(&self) -> usize {
        MAGIC_LENGTH + CHECKSUM_LENGTH + self.payload.len()
    }

    /// Total bytes this message occupies inside a message set.
    pub fn wire_size(&self) -> usize {
        MESSAGE_LENGTH_LENGTH + self.size()
    }

    /// Appends the message-set encoding of this message to `buffer`.
    pub(crate) fn put(&self, buffer: &mut BytesMut) {
        buffer.put_u32(self.size() as u32);
        buffer.put_u8(MAGIC);
        buffer.put_u32(self.checksum());
        buffer.put_slice(&self.payload);
    }
}

impl From<&str> for Message {
    fn from(payload: &str) -> Self {
        Message::new(Bytes::copy_from_slice(payload.as_bytes()))
    }
}

impl From<String> for Message {
    fn from(payload: String) -> Self {
        Message::new(Bytes::from(payload))
    }
}

impl From<Vec<u8>> for Message {
    fn from(payload: Vec<u8>) -> Self {
        Message::new(Bytes::from(payload))
    }
}

impl From<&[u8]> for Message {
    fn from(payload: &[u8]) -> Self {
        Message::new(Bytes::copy_from_slice(payload))
    }
}

impl From<Bytes> for Message {
    fn from(payload: Bytes) -> Self {
        Message::new(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_ieee_crc32() {
        assert_eq!(compute_checksum(b"hello"), 0x3610_a686);
        assert_eq!(compute_checksum(b""), 0);
    }

    #[test]
    fn test_message_wire_encoding() {
        let message = Message::from("test");
        let mut buffer = BytesMut::new();
        message.put(&mut buffer);

        assert_eq!(buffer.len(), message.wire_size());
        assert_eq!(&buffer[..4], &9u32.to_be_bytes());
        assert_eq!(buffer[4], MAGIC);
        assert_eq!(&buffer[5..9], &0xd87f_7e0c_u32.to_be_bytes());
        assert_eq!(&buffer[9..], b"test");
    }

    #[test]
    fn test_message_from_text() {
        let message = Message::from("caf\u{e9}");
        assert_eq!(message.payload().as_ref(), "café".as_bytes());
        assert_eq!(message.size(), 5 + "café".len());
    }
}
