use thiserror::Error;

pub type KafkaResult<T> = Result<T, KafkaError>;

/// Errors surfaced by client operations.
///
/// `OffsetOutOfRange`, `InvalidMessage`, `WrongPartition` and
/// `InvalidFetchSize` mirror the broker's error code table;
/// the remaining kinds are raised on the client side.
#[derive(Debug, Error)]
pub enum KafkaError {
    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("The requested offset is not within range: {0}")]
    OffsetOutOfRange(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Wrong partition: {0}")]
    WrongPartition(String),

    #[error("Invalid fetch size: {0}")]
    InvalidFetchSize(String),

    #[error("The server experienced an unexpected error: {0}")]
    Unknown(String),

    #[error("invalid offset: {0}")]
    InvalidOffset(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("config file error: {0}")]
    ConfigFile(#[from] config::ConfigError),
}

impl KafkaError {
    /// Whether this failure belongs to the retryable connectivity class.
    /// Polling loops refetch on these instead of surfacing them.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, KafkaError::ConnectionFailure(_) | KafkaError::Io(_))
    }
}
