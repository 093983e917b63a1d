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

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, error};

use crate::message::compute_checksum;
use crate::protocol::{CHECKSUM_LENGTH, MAGIC, MAGIC_LENGTH, MESSAGE_LENGTH_LENGTH};

/// A message decoded out of a fetch response body.
///
/// `offset` is the log position of the entry's first byte, which is also
/// the value a subsequent fetch must pass to read the entries that follow
/// it. Offsets are byte positions, not sequence numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    pub offset: u64,
    pub payload: Bytes,
    pub corrupt: bool,
}

/// Iterator over the message set carried by a fetch response.
///
/// The broker cuts fetch responses at `max_size` bytes without regard to
/// message boundaries, so the last entry of a set is routinely truncated.
/// An entry cut inside its payload is dropped silently unless
/// `include_corrupt` is set, in which case the partial payload is yielded
/// with `corrupt` raised; a cut inside the 9-byte header is logged before
/// iteration ends. Entries whose magic byte or checksum fail verification
/// are always yielded with `corrupt` raised so callers can account for
/// them.
///
/// Iteration stops at the first structurally undecodable entry; bytes
/// past it cannot be framed and are discarded.
#[derive(Clone, PartialEq, Eq)]
pub struct MessageSet {
    buffer: BytesMut,
    base_offset: u64,
    initial_len: usize,
    include_corrupt: bool,
    done: bool,
}

impl std::fmt::Debug for MessageSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSet")
            .field("base_offset", &self.base_offset)
            .field("buffer length", &self.buffer.len())
            .finish()
    }
}

impl MessageSet {
    /// Wraps a fetch response body whose first byte sits at `base_offset`
    /// in the partition log.
    pub fn new(base_offset: u64, buffer: BytesMut, include_corrupt: bool) -> MessageSet {
        let initial_len = buffer.len();
        MessageSet {
            buffer,
            base_offset,
            initial_len,
            include_corrupt,
            done: false,
        }
    }

    fn finish<T>(&mut self, item: Option<T>) -> Option<T> {
        self.done = true;
        self.buffer.clear();
        item
    }
}

impl Iterator for MessageSet {
    type Item = FetchedMessage;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let offset = self.base_offset + (self.initial_len - self.buffer.len()) as u64;

        if self.buffer.is_empty() {
            return self.finish(None);
        }
        if self.buffer.len() < MESSAGE_LENGTH_LENGTH {
            error!(
                "unexpected end of message set: {} bytes left inside a message length field",
                self.buffer.len()
            );
            return self.finish(None);
        }
        let message_length = self.buffer.get_u32() as usize;
        if message_length < MAGIC_LENGTH + CHECKSUM_LENGTH {
            error!(
                "message at offset {} declares length {}, smaller than its own header",
                offset, message_length
            );
            return self.finish(None);
        }

        if self.buffer.is_empty() {
            error!("unexpected end of message set: no bytes left for the magic byte");
            return self.finish(None);
        }
        let magic = self.buffer.get_u8();
        if self.buffer.len() < CHECKSUM_LENGTH {
            error!(
                "unexpected end of message set: {} bytes left inside the checksum",
                self.buffer.len()
            );
            return self.finish(None);
        }
        let checksum = self.buffer.get_u32();

        let payload_length = message_length - MAGIC_LENGTH - CHECKSUM_LENGTH;
        let truncated = self.buffer.len() < payload_length;
        let payload = if truncated {
            if !self.include_corrupt {
                return self.finish(None);
            }
            self.buffer.split()
        } else {
            self.buffer.split_to(payload_length)
        };

        let actual_checksum = compute_checksum(&payload);
        let corrupt = if magic != MAGIC {
            error!(
                "unexpected magic byte {} at offset {} (expecting {})",
                magic, offset, MAGIC
            );
            true
        } else if checksum != actual_checksum {
            error!(
                "checksum failure at offset {}: expected {}, but found {}",
                offset, checksum, actual_checksum
            );
            true
        } else {
            truncated
        };

        if truncated {
            self.done = true;
        }

        debug!(
            "decoded message at offset {} ({} bytes, corrupt: {})",
            offset,
            payload.len(),
            corrupt
        );
        Some(FetchedMessage {
            offset,
            payload: payload.freeze(),
            corrupt,
        })
    }
}
