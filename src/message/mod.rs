pub use message::{compute_checksum, Message};
pub use message_set::{FetchedMessage, MessageSet};
mod message;
mod message_set;
