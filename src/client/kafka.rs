// Copyright 2025 jonefeewang@gmail.com
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use bytes::{Buf, BytesMut};
use tracing::{debug, info};

use crate::client::partition::Partition;
use crate::client::{ClientConfig, KafkaResult};
use crate::message::{FetchedMessage, Message, MessageSet};
use crate::network::{BrokerConnection, TcpConnection};
use crate::protocol::{
    decode_offsets_response, decode_response_envelope, fetch_request, offsets_request,
    produce_request, DEFAULT_PARTITION, RESPONSE_SIZE_LENGTH,
};

/// Client for a single legacy kafka broker.
///
/// All calls are blocking and run over one connection. Produce is
/// fire-and-forget on this protocol generation; fetch and offsets are
/// request-response round trips.
pub struct KafkaClient<C = TcpConnection> {
    config: ClientConfig,
    connection: C,
}

impl KafkaClient<TcpConnection> {
    /// Creates a client for the broker named in `config`. No connection
    /// is made until the first request.
    pub fn new(config: ClientConfig) -> KafkaClient {
        let connection = TcpConnection::new(config.broker.host.clone(), config.broker.port);
        KafkaClient { config, connection }
    }
}

impl<C: BrokerConnection> KafkaClient<C> {
    /// Creates a client over an already-built transport. This is how
    /// tests run the protocol without a broker.
    pub fn with_connection(config: ClientConfig, connection: C) -> KafkaClient<C> {
        KafkaClient { config, connection }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Appends `messages` to a topic-partition.
    ///
    /// The broker sends nothing back for a produce request, so a
    /// successful return only means the bytes were handed to the
    /// transport.
    pub fn produce(
        &mut self,
        topic: &str,
        messages: &[Message],
        partition: u32,
    ) -> KafkaResult<()> {
        let frame = produce_request(topic, partition, messages);
        self.connection.write(&frame)?;
        info!(
            "produced {} messages to {}-{}",
            messages.len(),
            topic,
            partition
        );
        Ok(())
    }

    /// Fetches messages starting at the byte offset `offset`.
    ///
    /// `max_size` bounds the response body; when `None`, the configured
    /// fetch defaults apply.
    pub fn fetch(
        &mut self,
        topic: &str,
        offset: u64,
        partition: u32,
        max_size: Option<u32>,
    ) -> KafkaResult<Vec<FetchedMessage>> {
        let max_size = max_size.unwrap_or(self.config.fetch.max_size);
        let include_corrupt = self.config.fetch.include_corrupt;
        self.fetch_messages(topic, offset, partition, max_size, include_corrupt)
    }

    pub(crate) fn fetch_messages(
        &mut self,
        topic: &str,
        offset: u64,
        partition: u32,
        max_size: u32,
        include_corrupt: bool,
    ) -> KafkaResult<Vec<FetchedMessage>> {
        let (size, body) = fetch_request(topic, offset, partition, max_size);
        self.connection.write(&size)?;
        self.connection.write(&body)?;
        let response = self.read_response()?;
        debug!(
            "fetched {} bytes from {}-{} at offset {}",
            response.len(),
            topic,
            partition,
            offset
        );
        Ok(MessageSet::new(offset, response, include_corrupt).collect())
    }

    /// Asks the broker for up to `max_offsets` known offsets at or
    /// before `time_value`, newest first. `LATEST_OFFSET` and
    /// `EARLIEST_OFFSET` name the ends of the log.
    pub fn offsets(
        &mut self,
        topic: &str,
        time_value: i64,
        max_offsets: u32,
        partition: u32,
    ) -> KafkaResult<Vec<u64>> {
        let (size, body) = offsets_request(topic, time_value, max_offsets, partition);
        self.connection.write(&size)?;
        self.connection.write(&body)?;
        let mut response = self.read_response()?;
        decode_offsets_response(&mut response)
    }

    /// Returns a handle scoped to one topic-partition for offset
    /// queries and polling.
    pub fn partition(&mut self, topic: impl Into<String>, partition: u32) -> Partition<'_, C> {
        Partition::new(self, topic.into(), partition)
    }

    /// Shorthand for [`KafkaClient::partition`] on the default partition.
    pub fn topic(&mut self, topic: impl Into<String>) -> Partition<'_, C> {
        self.partition(topic, DEFAULT_PARTITION)
    }

    fn read_response(&mut self) -> KafkaResult<BytesMut> {
        let mut size = self.connection.read(RESPONSE_SIZE_LENGTH)?;
        let size = size.get_u32() as usize;
        let response = self.connection.read(size)?;
        decode_response_envelope(response)
    }
}
