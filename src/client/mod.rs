pub use config::{BrokerConfig, ClientConfig, FetchConfig};
pub use error::{KafkaError, KafkaResult};
pub use kafka::KafkaClient;
pub use partition::{
    Partition, PollOptions, Poller, PollingStatus, DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_LIMIT,
};
pub use tracing_config::setup_local_tracing;
mod config;
mod error;
mod kafka;
mod partition;
mod tracing_config;
