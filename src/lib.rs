mod client;
mod message;
mod network;
mod protocol;

pub use client::{
    setup_local_tracing, BrokerConfig, ClientConfig, FetchConfig, KafkaClient, KafkaError,
    KafkaResult, Partition, PollOptions, Poller, PollingStatus, DEFAULT_POLL_INTERVAL,
    DEFAULT_RETRY_LIMIT,
};
pub use message::{compute_checksum, FetchedMessage, Message, MessageSet};
pub use network::{BrokerConnection, TcpConnection, MAX_RETRY};
pub use protocol::{
    ErrorCode, RequestType, DEFAULT_MAX_SIZE, DEFAULT_PARTITION, EARLIEST_OFFSET, LATEST_OFFSET,
    MAGIC, MESSAGE_HEADER_SIZE,
};
