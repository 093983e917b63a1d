use bytes::{Buf, BytesMut};
use tracing::{debug, error};

use crate::client::{KafkaError, KafkaResult};
use crate::protocol::{ErrorCode, ERROR_CODE_LENGTH, OFFSET_COUNT_LENGTH, OFFSET_LENGTH};

/// Strips the error-code envelope off a response and returns the body.
///
/// Every fetch and offsets response opens with a 2-byte error code; a
/// non-zero code means the body is absent or meaningless, so it is
/// surfaced as the matching `KafkaError` instead.
pub fn decode_response_envelope(mut response: BytesMut) -> KafkaResult<BytesMut> {
    if response.len() < ERROR_CODE_LENGTH {
        return Err(KafkaError::MalformedResponse(format!(
            "response of {} bytes is too short for an error code",
            response.len()
        )));
    }
    let raw = response.get_u16();
    if let Some(error) = ErrorCode::from_code(raw).into_error() {
        error!("broker returned error code {}: {}", raw, error);
        return Err(error);
    }
    Ok(response)
}

/// Decodes the body of an offsets response into the offsets it carries.
pub fn decode_offsets_response(body: &mut BytesMut) -> KafkaResult<Vec<u64>> {
    if body.len() < OFFSET_COUNT_LENGTH {
        return Err(KafkaError::MalformedResponse(format!(
            "offsets response of {} bytes is too short for an offset count",
            body.len()
        )));
    }
    let count = body.get_u32() as usize;
    if body.len() < count * OFFSET_LENGTH {
        return Err(KafkaError::MalformedResponse(format!(
            "offsets response declares {} offsets but carries {} bytes",
            count,
            body.len()
        )));
    }
    let mut offsets = Vec::with_capacity(count);
    for _ in 0..count {
        offsets.push(body.get_u64());
    }
    debug!("broker returned {} offsets", offsets.len());
    Ok(offsets)
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;
    use rstest::rstest;

    use super::*;

    fn envelope(code: u16, body: &[u8]) -> BytesMut {
        let mut buffer = BytesMut::new();
        buffer.put_u16(code);
        buffer.put_slice(body);
        buffer
    }

    #[test]
    fn test_success_envelope_returns_body() {
        let body = decode_response_envelope(envelope(0, b"payload"));
        assert_eq!(body.unwrap().as_ref(), b"payload");
    }

    #[rstest]
    #[case(1, ErrorCode::OffsetOutOfRange)]
    #[case(2, ErrorCode::InvalidMessage)]
    #[case(3, ErrorCode::WrongPartition)]
    #[case(4, ErrorCode::InvalidFetchSize)]
    #[case(17, ErrorCode::Unknown)]
    fn test_error_envelope_maps_code(#[case] raw: u16, #[case] expected: ErrorCode) {
        let error = decode_response_envelope(envelope(raw, b"")).unwrap_err();
        assert_eq!(ErrorCode::from(&error), expected);
    }

    #[test]
    fn test_short_envelope_is_malformed() {
        let mut buffer = BytesMut::new();
        buffer.put_u8(0);
        let error = decode_response_envelope(buffer).unwrap_err();
        assert!(matches!(error, KafkaError::MalformedResponse(_)));
    }

    #[test]
    fn test_offsets_decode() {
        let mut body = BytesMut::new();
        body.put_u32(3);
        for offset in [0u64, 1024, 2048] {
            body.put_u64(offset);
        }
        assert_eq!(decode_offsets_response(&mut body).unwrap(), vec![0, 1024, 2048]);
    }

    #[test]
    fn test_offsets_decode_short_buffer() {
        let mut body = BytesMut::new();
        body.put_u32(2);
        body.put_u64(1024);
        let error = decode_offsets_response(&mut body).unwrap_err();
        assert!(matches!(error, KafkaError::MalformedResponse(_)));
    }
}
