//! Legacy kafka wire protocol.
//!
//! Requests open with a 4-byte big-endian size, then a 2-byte request
//! type; responses open with a 4-byte size and a 2-byte error code.
//! Request encoding and response decoding live here, away from any
//! transport concern.

pub use constants::*;
pub use error_code::ErrorCode;
pub use request::{fetch_request, offsets_request, produce_request, RequestType};
pub use response::{decode_offsets_response, decode_response_envelope};
mod constants;
mod error_code;
mod request;
mod response;
