use std::io::{Read, Write};
use std::net::TcpStream;

use bytes::BytesMut;
use tracing::{debug, error, trace};

use crate::client::{KafkaError, KafkaResult};

/// Write attempts made over a fresh connection before giving up.
pub const MAX_RETRY: u32 = 3;

/// A bidirectional byte stream to a broker.
///
/// The client is written against this trait so tests can swap the TCP
/// transport for a scripted one.
pub trait BrokerConnection {
    fn connect(&mut self) -> KafkaResult<()>;

    fn disconnect(&mut self);

    fn reconnect(&mut self) -> KafkaResult<()> {
        self.disconnect();
        self.connect()
    }

    /// Reads exactly `n` bytes, blocking until they arrive.
    fn read(&mut self, n: usize) -> KafkaResult<BytesMut>;

    fn write(&mut self, buffer: &[u8]) -> KafkaResult<()>;
}

/// Blocking TCP transport to a single broker.
///
/// The socket is established lazily on first use; a dropped connection
/// is re-established transparently on write, up to `MAX_RETRY` times.
#[derive(Debug)]
pub struct TcpConnection {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
}

impl TcpConnection {
    pub fn new(host: impl Into<String>, port: u16) -> TcpConnection {
        TcpConnection {
            host: host.into(),
            port,
            stream: None,
        }
    }

    fn stream(&mut self) -> KafkaResult<&mut TcpStream> {
        if self.stream.is_none() {
            self.connect()?;
        }
        match self.stream.as_mut() {
            Some(stream) => Ok(stream),
            None => unreachable!("stream was just established"),
        }
    }
}

fn is_connection_reset(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::ConnectionAborted
    )
}

impl BrokerConnection for TcpConnection {
    fn connect(&mut self) -> KafkaResult<()> {
        let stream = TcpStream::connect((self.host.as_str(), self.port)).map_err(|e| {
            KafkaError::ConnectionFailure(format!(
                "could not connect to kafka broker at {}:{}: {}",
                self.host, self.port, e
            ))
        })?;
        debug!("connected to kafka broker at {}:{}", self.host, self.port);
        self.stream = Some(stream);
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            trace!("disconnected from {}:{}", self.host, self.port);
        }
    }

    fn read(&mut self, n: usize) -> KafkaResult<BytesMut> {
        let mut buffer = BytesMut::zeroed(n);
        self.stream()?.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn write(&mut self, buffer: &[u8]) -> KafkaResult<()> {
        let mut retries = 0;
        loop {
            match self.stream()?.write_all(buffer) {
                Ok(()) => return Ok(()),
                Err(e) if is_connection_reset(&e) => {
                    if retries >= MAX_RETRY {
                        return Err(KafkaError::ConnectionFailure(format!(
                            "write of {} bytes failed after {} retries: {}",
                            buffer.len(),
                            retries,
                            e
                        )));
                    }
                    retries += 1;
                    error!(
                        "write failed ({}), reconnecting for retry {}/{}",
                        e, retries, MAX_RETRY
                    );
                    self.reconnect()?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
