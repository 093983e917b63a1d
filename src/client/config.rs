use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::client::KafkaResult;
use crate::protocol::DEFAULT_MAX_SIZE;

/// Address of the broker to talk to.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
}

/// Defaults applied to fetches when the caller does not override them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FetchConfig {
    /// Upper bound on a fetch response body, in bytes.
    pub max_size: u32,
    /// Whether partial and damaged messages are surfaced to callers.
    pub include_corrupt: bool,
}

/// Client configuration, loadable from a TOML file.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClientConfig {
    pub broker: BrokerConfig,
    pub fetch: FetchConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            broker: BrokerConfig {
                host: "localhost".to_string(),
                port: 9092,
            },
            fetch: FetchConfig {
                max_size: DEFAULT_MAX_SIZE,
                include_corrupt: false,
            },
        }
    }
}

impl ClientConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> KafkaResult<ClientConfig> {
        let path = path.as_ref().to_str().ok_or_else(|| {
            config::ConfigError::Message(format!(
                "config path {:?} is not valid utf-8",
                path.as_ref()
            ))
        })?;
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}
