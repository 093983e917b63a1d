use bytes::{BufMut, BytesMut};

use crate::message::Message;
use crate::protocol::{
    MAX_OFFSETS_LENGTH, MAX_SIZE_LENGTH, MESSAGE_SET_SIZE_LENGTH, OFFSET_LENGTH, PARTITION_LENGTH,
    REQUEST_SIZE_LENGTH, REQUEST_TYPE_LENGTH, TIME_VALUE_LENGTH, TOPIC_LENGTH_LENGTH,
};

/// Request ids understood by legacy brokers.
///
/// `MultiFetch` and `MultiProduce` are part of the wire protocol but not
/// issued by this client; they are kept so the id space reads complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum RequestType {
    Produce = 0,
    Fetch = 1,
    MultiFetch = 2,
    MultiProduce = 3,
    Offsets = 4,
}

fn header_size(topic: &str) -> usize {
    REQUEST_TYPE_LENGTH + TOPIC_LENGTH_LENGTH + topic.len() + PARTITION_LENGTH
}

fn put_request_header(
    buffer: &mut BytesMut,
    request_type: RequestType,
    topic: &str,
    partition: u32,
) {
    buffer.put_u16(request_type as u16);
    buffer.put_u16(topic.len() as u16);
    buffer.put_slice(topic.as_bytes());
    buffer.put_u32(partition);
}

fn request_size(body_size: usize) -> BytesMut {
    let mut size = BytesMut::with_capacity(REQUEST_SIZE_LENGTH);
    size.put_u32(body_size as u32);
    size
}

/// Encodes a produce request as one contiguous frame, size prefix
/// included. Produce requests receive no response, so the frame is all
/// there is to the exchange.
pub fn produce_request(topic: &str, partition: u32, messages: &[Message]) -> BytesMut {
    let set_size: usize = messages.iter().map(|m| m.wire_size()).sum();
    let body_size = header_size(topic) + MESSAGE_SET_SIZE_LENGTH + set_size;

    let mut buffer = BytesMut::with_capacity(REQUEST_SIZE_LENGTH + body_size);
    buffer.put_u32(body_size as u32);
    put_request_header(&mut buffer, RequestType::Produce, topic, partition);
    buffer.put_u32(set_size as u32);
    for message in messages {
        message.put(&mut buffer);
    }
    buffer
}

/// Encodes a fetch request as a (size prefix, body) pair.
pub fn fetch_request(
    topic: &str,
    offset: u64,
    partition: u32,
    max_size: u32,
) -> (BytesMut, BytesMut) {
    let body_size = header_size(topic) + OFFSET_LENGTH + MAX_SIZE_LENGTH;
    let mut body = BytesMut::with_capacity(body_size);
    put_request_header(&mut body, RequestType::Fetch, topic, partition);
    body.put_u64(offset);
    body.put_u32(max_size);
    (request_size(body.len()), body)
}

/// Encodes an offsets request as a (size prefix, body) pair.
///
/// `time_value` is signed so the `LATEST_OFFSET` and `EARLIEST_OFFSET`
/// sentinels travel as -1 and -2; any other value is a broker-side
/// timestamp in milliseconds.
pub fn offsets_request(
    topic: &str,
    time_value: i64,
    max_offsets: u32,
    partition: u32,
) -> (BytesMut, BytesMut) {
    let body_size = header_size(topic) + TIME_VALUE_LENGTH + MAX_OFFSETS_LENGTH;
    let mut body = BytesMut::with_capacity(body_size);
    put_request_header(&mut body, RequestType::Offsets, topic, partition);
    body.put_i64(time_value);
    body.put_u32(max_offsets);
    (request_size(body.len()), body)
}
