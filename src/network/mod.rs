//! Broker transport.
//!
//! A single blocking TCP connection per client, hidden behind the
//! `BrokerConnection` trait so the protocol layer can be driven by a
//! scripted stream in tests.

pub use connection::{BrokerConnection, TcpConnection, MAX_RETRY};
mod connection;
