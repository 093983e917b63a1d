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

use std::thread;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Local};
use tracing::{error, info};

use crate::client::kafka::KafkaClient;
use crate::client::{KafkaError, KafkaResult};
use crate::network::BrokerConnection;
use crate::protocol::{EARLIEST_OFFSET, LATEST_OFFSET, MESSAGE_HEADER_SIZE};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

/// A client borrowed down to one topic-partition.
///
/// Obtained from [`KafkaClient::partition`]; offset queries go through
/// it directly, and `poll` turns it into a [`Poller`].
pub struct Partition<'a, C> {
    client: &'a mut KafkaClient<C>,
    topic: String,
    partition: u32,
}

/// Tuning for a polling run. `Default` polls from the latest offset,
/// forever, at one-second intervals.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Byte offset to start from; `None` starts at the log end.
    pub offset: Option<u64>,
    /// Stop once the next offset passes this bound; `None` never stops.
    pub end_offset: Option<u64>,
    /// Pause between fetches that return nothing, and between
    /// connectivity retries.
    pub poll_interval: Duration,
    /// Fetch size bound; `None` takes the configured default.
    pub max_size: Option<u32>,
    /// Yield partial and damaged messages instead of dropping them.
    pub include_corrupt: bool,
    /// Connectivity failures tolerated per fetch position before the
    /// poller fails; `None` retries forever.
    pub retry_limit: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        PollOptions {
            offset: None,
            end_offset: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_size: None,
            include_corrupt: false,
            retry_limit: Some(DEFAULT_RETRY_LIMIT),
        }
    }
}

/// Progress snapshot yielded alongside every batch of payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct PollingStatus {
    pub start_offset: u64,
    pub next_offset: u64,
    pub last_offset_read: Option<u64>,
    pub messages_read: u64,
    pub bytes_read: u64,
    pub num_fetches: u64,
    pub polling_start_time: DateTime<Local>,
    pub seconds_slept: Duration,
}

impl<'a, C: BrokerConnection> Partition<'a, C> {
    pub(crate) fn new(
        client: &'a mut KafkaClient<C>,
        topic: String,
        partition: u32,
    ) -> Partition<'a, C> {
        Partition {
            client,
            topic,
            partition,
        }
    }

    /// Offset of the oldest message still held by the broker.
    pub fn earliest_offset(&mut self) -> KafkaResult<u64> {
        single_offset(self.client, &self.topic, self.partition, EARLIEST_OFFSET)
    }

    /// Offset one past the newest message, where the next produce will
    /// land.
    pub fn latest_offset(&mut self) -> KafkaResult<u64> {
        single_offset(self.client, &self.topic, self.partition, LATEST_OFFSET)
    }

    /// Converts the handle into a polling iterator over the partition.
    pub fn poll(self, options: PollOptions) -> Poller<'a, C> {
        let max_size = options
            .max_size
            .unwrap_or(self.client.config().fetch.max_size);
        Poller {
            client: self.client,
            topic: self.topic,
            partition: self.partition,
            end_offset: options.end_offset,
            poll_interval: options.poll_interval,
            max_size,
            include_corrupt: options.include_corrupt,
            retry_limit: options.retry_limit,
            offset: options.offset,
            start_offset: options.offset,
            last_offset_read: None,
            messages_read: 0,
            bytes_read: 0,
            num_fetches: 0,
            seconds_slept: Duration::ZERO,
            polling_start_time: Local::now(),
            retry_attempts: 0,
            first_cycle: true,
            sleep_pending: false,
            finished: false,
        }
    }
}

fn single_offset<C: BrokerConnection>(
    client: &mut KafkaClient<C>,
    topic: &str,
    partition: u32,
    time_value: i64,
) -> KafkaResult<u64> {
    let offsets = client.offsets(topic, time_value, 1, partition)?;
    match offsets.first() {
        Some(&offset) => Ok(offset),
        None => Err(KafkaError::MalformedResponse(format!(
            "broker returned no offsets for {}-{}",
            topic, partition
        ))),
    }
}

/// Blocking iterator that repeatedly fetches a partition and yields
/// `(status, payloads)` per fetch cycle, empty cycles included.
///
/// Empty cycles schedule a `poll_interval` sleep which is taken lazily,
/// at the top of the next `next()` call, so a consumer that stops
/// iterating never pays for it. Connectivity failures are retried in
/// place up to `retry_limit` times; any surfaced error ends the
/// iterator. Dropping the poller mid-run needs no cleanup.
pub struct Poller<'a, C> {
    client: &'a mut KafkaClient<C>,
    topic: String,
    partition: u32,
    end_offset: Option<u64>,
    poll_interval: Duration,
    max_size: u32,
    include_corrupt: bool,
    retry_limit: Option<u32>,
    offset: Option<u64>,
    start_offset: Option<u64>,
    last_offset_read: Option<u64>,
    messages_read: u64,
    bytes_read: u64,
    num_fetches: u64,
    seconds_slept: Duration,
    polling_start_time: DateTime<Local>,
    retry_attempts: u32,
    first_cycle: bool,
    sleep_pending: bool,
    finished: bool,
}

impl<C: BrokerConnection> Poller<'_, C> {
    fn poll_cycle(&mut self) -> KafkaResult<Option<(PollingStatus, Vec<Bytes>)>> {
        let mut offset = match self.offset {
            Some(offset) => offset,
            None => {
                let latest =
                    single_offset(self.client, &self.topic, self.partition, LATEST_OFFSET)?;
                info!(
                    "starting poll of {}-{} at latest offset {}",
                    self.topic, self.partition, latest
                );
                self.offset = Some(latest);
                self.start_offset = Some(latest);
                latest
            }
        };

        if self.sleep_pending {
            self.sleep_pending = false;
            thread::sleep(self.poll_interval);
            self.seconds_slept += self.poll_interval;
        }

        if let Some(end) = self.end_offset {
            if offset > end {
                return Ok(None);
            }
        }

        let mut batch = loop {
            match self.client.fetch_messages(
                &self.topic,
                offset,
                self.partition,
                self.max_size,
                self.include_corrupt,
            ) {
                Ok(batch) => {
                    self.retry_attempts = 0;
                    break batch;
                }
                Err(e) if e.is_connectivity() => {
                    if let Some(limit) = self.retry_limit {
                        if self.retry_attempts >= limit {
                            return Err(e);
                        }
                    }
                    self.retry_attempts += 1;
                    error!(
                        "retry {} for fetch of {}-{} at offset {}: {}",
                        self.retry_attempts, self.topic, self.partition, offset, e
                    );
                    thread::sleep(self.poll_interval);
                }
                Err(KafkaError::OffsetOutOfRange(_)) => {
                    let earliest =
                        single_offset(self.client, &self.topic, self.partition, EARLIEST_OFFSET)?;
                    let latest =
                        single_offset(self.client, &self.topic, self.partition, LATEST_OFFSET)?;
                    return Err(KafkaError::OffsetOutOfRange(format!(
                        "offset {} is out of range for {}-{} (earliest: {}, latest: {})",
                        offset, self.topic, self.partition, earliest, latest
                    )));
                }
                Err(e) => return Err(e),
            }
        };
        self.num_fetches += 1;

        if let Some(end) = self.end_offset {
            batch.retain(|message| message.offset <= end);
        }

        if self.first_cycle {
            self.first_cycle = false;
            if batch.is_empty() {
                self.validate_start_offset(offset)?;
            }
        }

        if let Some(last) = batch.last() {
            self.last_offset_read = Some(last.offset);
            offset = last.offset + (last.payload.len() + MESSAGE_HEADER_SIZE) as u64;
            self.offset = Some(offset);
        }

        self.messages_read += batch.len() as u64;
        self.bytes_read += batch
            .iter()
            .map(|message| message.payload.len() as u64)
            .sum::<u64>();

        if !self.poll_interval.is_zero() && batch.is_empty() {
            self.sleep_pending = true;
        }

        let status = PollingStatus {
            start_offset: self.start_offset.unwrap_or(offset),
            next_offset: offset,
            last_offset_read: self.last_offset_read,
            messages_read: self.messages_read,
            bytes_read: self.bytes_read,
            num_fetches: self.num_fetches,
            polling_start_time: self.polling_start_time,
            seconds_slept: self.seconds_slept,
        };
        let payloads = batch.into_iter().map(|message| message.payload).collect();
        Ok(Some((status, payloads)))
    }

    /// A fetch inside the log range that decodes to nothing means the
    /// requested offset does not sit on a message boundary.
    fn validate_start_offset(&mut self, offset: u64) -> KafkaResult<()> {
        let earliest = single_offset(self.client, &self.topic, self.partition, EARLIEST_OFFSET)?;
        let latest = single_offset(self.client, &self.topic, self.partition, LATEST_OFFSET)?;
        if earliest <= offset && offset < latest {
            let recheck = self.client.fetch_messages(
                &self.topic,
                offset,
                self.partition,
                self.max_size,
                self.include_corrupt,
            )?;
            if recheck.is_empty() {
                return Err(KafkaError::InvalidOffset(format!(
                    "offset {} in {}-{} does not begin a message",
                    offset, self.topic, self.partition
                )));
            }
        }
        Ok(())
    }
}

impl<C: BrokerConnection> Iterator for Poller<'_, C> {
    type Item = KafkaResult<(PollingStatus, Vec<Bytes>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.poll_cycle() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
