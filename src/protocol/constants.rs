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

//! Wire Format Constants
//!
//! This module defines the constants used by the legacy wire format:
//! field widths for requests and responses, the message header layout,
//! and the special values understood by the broker.
//!
//! # Request Format
//!
//! Every request shares the same outer shape:
//! - 4-byte total size
//! - 2-byte request type
//! - 2-byte topic length
//! - Variable-length topic name
//! - 4-byte partition
//! - Request-specific fields
//!
//! # Message Format
//!
//! A message set is a concatenation of:
//! - 4-byte message length (covers magic, checksum and payload)
//! - 1-byte magic
//! - 4-byte CRC32 checksum of the payload
//! - Variable-length payload
//!
//! All integers are big-endian. The offsets request time value is the
//! only signed field; it carries the [`LATEST_OFFSET`] and
//! [`EARLIEST_OFFSET`] sentinels.

// Request field lengths
pub const REQUEST_SIZE_LENGTH: usize = 4;
pub const REQUEST_TYPE_LENGTH: usize = 2;
pub const TOPIC_LENGTH_LENGTH: usize = 2;
pub const PARTITION_LENGTH: usize = 4;
pub const OFFSET_LENGTH: usize = 8;
pub const MAX_SIZE_LENGTH: usize = 4;
pub const TIME_VALUE_LENGTH: usize = 8;
pub const MAX_OFFSETS_LENGTH: usize = 4;
pub const MESSAGE_SET_SIZE_LENGTH: usize = 4;

// Response field lengths
pub const RESPONSE_SIZE_LENGTH: usize = 4;
pub const ERROR_CODE_LENGTH: usize = 2;
pub const OFFSET_COUNT_LENGTH: usize = 4;

// Message field offsets and lengths
pub const MESSAGE_LENGTH_OFFSET: usize = 0;
pub const MESSAGE_LENGTH_LENGTH: usize = 4;
pub const MAGIC_OFFSET: usize = MESSAGE_LENGTH_OFFSET + MESSAGE_LENGTH_LENGTH;
pub const MAGIC_LENGTH: usize = 1;
pub const CHECKSUM_OFFSET: usize = MAGIC_OFFSET + MAGIC_LENGTH;
pub const CHECKSUM_LENGTH: usize = 4;
pub const PAYLOAD_OFFSET: usize = CHECKSUM_OFFSET + CHECKSUM_LENGTH;
/// Bytes of header preceding every message payload in a message set
pub const MESSAGE_HEADER_SIZE: usize = PAYLOAD_OFFSET;

// Special values and defaults

/// Magic value for the legacy message format version
pub const MAGIC: u8 = 0;
/// Time value resolving to the next offset to be written
pub const LATEST_OFFSET: i64 = -1;
/// Time value resolving to the first offset still present in the log
pub const EARLIEST_OFFSET: i64 = -2;
/// Partition used when the caller does not name one
pub const DEFAULT_PARTITION: u32 = 0;
/// Default upper bound on the bytes returned by one fetch (1MB)
pub const DEFAULT_MAX_SIZE: u32 = 1024 * 1024;
