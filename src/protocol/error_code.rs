use crate::client::KafkaError;

/// Error codes carried in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(i16)]
pub enum ErrorCode {
    Unknown = -1,
    None = 0,
    OffsetOutOfRange = 1,
    InvalidMessage = 2,
    WrongPartition = 3,
    InvalidFetchSize = 4,
}

impl ErrorCode {
    /// Error description information
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Unknown => {
                "The server experienced an unexpected error when processing the request"
            }
            ErrorCode::None => "",
            ErrorCode::OffsetOutOfRange => {
                "The requested offset is not within the range of offsets maintained by the server"
            }
            ErrorCode::InvalidMessage => {
                "The message contents do not match their checksum or are otherwise corrupt"
            }
            ErrorCode::WrongPartition => "The requested partition does not exist on this server",
            ErrorCode::InvalidFetchSize => "The requested fetch size is invalid",
        }
    }

    /// Converts an error code number into an ErrorCode. Codes the table
    /// does not name collapse into `Unknown`.
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => ErrorCode::None,
            1 => ErrorCode::OffsetOutOfRange,
            2 => ErrorCode::InvalidMessage,
            3 => ErrorCode::WrongPartition,
            4 => ErrorCode::InvalidFetchSize,
            _ => ErrorCode::Unknown,
        }
    }

    /// Converts an ErrorCode into a KafkaError
    pub fn into_error(self) -> Option<KafkaError> {
        match self {
            ErrorCode::None => None,
            ErrorCode::Unknown => Some(KafkaError::Unknown(self.message().to_string())),
            ErrorCode::OffsetOutOfRange => {
                Some(KafkaError::OffsetOutOfRange(self.message().to_string()))
            }
            ErrorCode::InvalidMessage => {
                Some(KafkaError::InvalidMessage(self.message().to_string()))
            }
            ErrorCode::WrongPartition => {
                Some(KafkaError::WrongPartition(self.message().to_string()))
            }
            ErrorCode::InvalidFetchSize => {
                Some(KafkaError::InvalidFetchSize(self.message().to_string()))
            }
        }
    }
}

impl From<&KafkaError> for ErrorCode {
    fn from(error: &KafkaError) -> Self {
        match error {
            KafkaError::OffsetOutOfRange(_) => ErrorCode::OffsetOutOfRange,
            KafkaError::InvalidMessage(_) => ErrorCode::InvalidMessage,
            KafkaError::WrongPartition(_) => ErrorCode::WrongPartition,
            KafkaError::InvalidFetchSize(_) => ErrorCode::InvalidFetchSize,
            _ => ErrorCode::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_conversion() {
        let code = ErrorCode::OffsetOutOfRange;
        let error = code.into_error().unwrap();
        assert_eq!(ErrorCode::from(&error), code);
    }

    #[test]
    fn test_error_messages() {
        let code = ErrorCode::OffsetOutOfRange;
        let error = code.into_error().unwrap();
        assert!(error.to_string().contains("offset is not within range"));
    }

    #[test]
    fn test_from_code() {
        assert_eq!(ErrorCode::from_code(0), ErrorCode::None);
        assert_eq!(ErrorCode::from_code(1), ErrorCode::OffsetOutOfRange);
        assert_eq!(ErrorCode::from_code(4), ErrorCode::InvalidFetchSize);
        assert_eq!(ErrorCode::from_code(999), ErrorCode::Unknown);
    }

    #[test]
    fn test_none_produces_no_error() {
        assert!(ErrorCode::None.into_error().is_none());
    }
}
