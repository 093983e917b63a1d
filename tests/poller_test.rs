use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use flintmq::{
    compute_checksum, BrokerConnection, ClientConfig, KafkaClient, KafkaError, KafkaResult,
    PollOptions, MAGIC,
};

/// One scripted broker turn: either a full response frame or a dropped
/// connection.
enum Outcome {
    Reply(BytesMut),
    Disconnect,
}

struct ScriptInner {
    outcomes: VecDeque<Outcome>,
    current: Option<BytesMut>,
}

/// Streams scripted outcomes in order. A `Disconnect` fails the write
/// that runs into it, the way a dead TCP peer would.
#[derive(Clone)]
struct ScriptedConnection {
    inner: Rc<RefCell<ScriptInner>>,
}

impl Default for ScriptedConnection {
    fn default() -> Self {
        ScriptedConnection {
            inner: Rc::new(RefCell::new(ScriptInner {
                outcomes: VecDeque::new(),
                current: None,
            })),
        }
    }
}

impl ScriptedConnection {
    fn push_reply(&self, error_code: u16, body: &[u8]) {
        let mut frame = BytesMut::new();
        frame.put_u32((2 + body.len()) as u32);
        frame.put_u16(error_code);
        frame.put_slice(body);
        self.inner
            .borrow_mut()
            .outcomes
            .push_back(Outcome::Reply(frame));
    }

    fn push_disconnect(&self) {
        self.inner
            .borrow_mut()
            .outcomes
            .push_back(Outcome::Disconnect);
    }

    fn outcomes_left(&self) -> usize {
        self.inner.borrow().outcomes.len()
    }
}

impl BrokerConnection for ScriptedConnection {
    fn connect(&mut self) -> KafkaResult<()> {
        Ok(())
    }

    fn disconnect(&mut self) {}

    fn read(&mut self, n: usize) -> KafkaResult<BytesMut> {
        let mut inner = self.inner.borrow_mut();
        if inner.current.is_none() {
            match inner.outcomes.pop_front() {
                Some(Outcome::Reply(frame)) => inner.current = Some(frame),
                Some(Outcome::Disconnect) | None => {
                    return Err(KafkaError::ConnectionFailure(
                        "connection reset by scripted broker".to_string(),
                    ));
                }
            }
        }
        let (chunk, drained) = match inner.current.as_mut() {
            Some(frame) if frame.len() >= n => {
                let chunk = frame.split_to(n);
                (chunk, frame.is_empty())
            }
            _ => {
                return Err(KafkaError::ConnectionFailure(
                    "scripted reply exhausted".to_string(),
                ));
            }
        };
        if drained {
            inner.current = None;
        }
        Ok(chunk)
    }

    fn write(&mut self, _buffer: &[u8]) -> KafkaResult<()> {
        let mut inner = self.inner.borrow_mut();
        if matches!(inner.outcomes.front(), Some(Outcome::Disconnect)) {
            inner.outcomes.pop_front();
            return Err(KafkaError::ConnectionFailure(
                "connection reset".to_string(),
            ));
        }
        Ok(())
    }
}

fn message_entry(payload: &[u8]) -> BytesMut {
    let mut buffer = BytesMut::new();
    buffer.put_u32((payload.len() + 5) as u32);
    buffer.put_u8(MAGIC);
    buffer.put_u32(compute_checksum(payload));
    buffer.put_slice(payload);
    buffer
}

fn message_set(payloads: &[&str]) -> BytesMut {
    let mut buffer = BytesMut::new();
    for payload in payloads {
        buffer.put_slice(&message_entry(payload.as_bytes()));
    }
    buffer
}

fn offsets_body(offsets: &[u64]) -> BytesMut {
    let mut body = BytesMut::new();
    body.put_u32(offsets.len() as u32);
    for &offset in offsets {
        body.put_u64(offset);
    }
    body
}

fn poll_client(connection: &ScriptedConnection) -> KafkaClient<ScriptedConnection> {
    KafkaClient::with_connection(ClientConfig::default(), connection.clone())
}

fn instant_options() -> PollOptions {
    PollOptions {
        poll_interval: Duration::ZERO,
        ..PollOptions::default()
    }
}

#[test]
fn test_poll_reads_through_end_offset() {
    let connection = ScriptedConnection::default();
    // Two 4-byte payloads occupy 13 bytes each.
    connection.push_reply(0, &message_set(&["aaaa", "bbbb"]));
    connection.push_reply(0, &message_set(&["cccc"]));
    let mut client = poll_client(&connection);

    let mut poller = client.partition("orders", 0).poll(PollOptions {
        offset: Some(0),
        end_offset: Some(26),
        ..instant_options()
    });

    let (status, payloads) = poller.next().unwrap().unwrap();
    assert_eq!(payloads, vec![Bytes::from("aaaa"), Bytes::from("bbbb")]);
    assert_eq!(status.start_offset, 0);
    assert_eq!(status.next_offset, 26);
    assert_eq!(status.last_offset_read, Some(13));
    assert_eq!(status.num_fetches, 1);

    let (status, payloads) = poller.next().unwrap().unwrap();
    assert_eq!(payloads, vec![Bytes::from("cccc")]);
    assert_eq!(status.next_offset, 39);
    assert_eq!(status.messages_read, 3);
    assert_eq!(status.bytes_read, 12);
    assert_eq!(status.num_fetches, 2);

    assert!(poller.next().is_none());
    assert!(poller.next().is_none());
    assert_eq!(connection.outcomes_left(), 0);
}

#[test]
fn test_poll_drops_messages_past_end_offset() {
    let connection = ScriptedConnection::default();
    connection.push_reply(0, &message_set(&["aaaa", "bbbb"]));
    let mut client = poll_client(&connection);

    let mut poller = client.partition("orders", 0).poll(PollOptions {
        offset: Some(0),
        end_offset: Some(5),
        ..instant_options()
    });

    let (status, payloads) = poller.next().unwrap().unwrap();
    assert_eq!(payloads, vec![Bytes::from("aaaa")]);
    assert_eq!(status.messages_read, 1);
    assert_eq!(status.bytes_read, 4);
    assert_eq!(status.next_offset, 13);

    assert!(poller.next().is_none());
}

#[test]
fn test_poll_starts_at_latest_when_no_offset_given() {
    let connection = ScriptedConnection::default();
    connection.push_reply(0, &offsets_body(&[100]));
    connection.push_reply(0, &message_set(&["xx"]));
    let mut client = poll_client(&connection);

    let mut poller = client.partition("orders", 0).poll(PollOptions {
        end_offset: Some(100),
        ..instant_options()
    });

    let (status, payloads) = poller.next().unwrap().unwrap();
    assert_eq!(payloads, vec![Bytes::from("xx")]);
    assert_eq!(status.start_offset, 100);
    assert_eq!(status.next_offset, 111);

    assert!(poller.next().is_none());
    assert_eq!(connection.outcomes_left(), 0);
}

#[test]
fn test_poll_retries_then_surfaces_failure() {
    let connection = ScriptedConnection::default();
    connection.push_disconnect();
    connection.push_disconnect();
    connection.push_disconnect();
    let mut client = poll_client(&connection);

    let mut poller = client.partition("orders", 0).poll(PollOptions {
        offset: Some(0),
        retry_limit: Some(2),
        ..instant_options()
    });

    // One initial attempt plus two retries, then the failure surfaces.
    let error = poller.next().unwrap().unwrap_err();
    assert!(error.is_connectivity());
    assert_eq!(connection.outcomes_left(), 0);
    assert!(poller.next().is_none());
}

#[test]
fn test_poll_retry_budget_resets_after_success() {
    let connection = ScriptedConnection::default();
    connection.push_disconnect();
    connection.push_reply(0, &message_set(&["aa"]));
    connection.push_disconnect();
    connection.push_disconnect();
    let mut client = poll_client(&connection);

    let mut poller = client.partition("orders", 0).poll(PollOptions {
        offset: Some(0),
        retry_limit: Some(1),
        ..instant_options()
    });

    let (status, payloads) = poller.next().unwrap().unwrap();
    assert_eq!(payloads, vec![Bytes::from("aa")]);
    assert_eq!(status.num_fetches, 1);

    let error = poller.next().unwrap().unwrap_err();
    assert!(error.is_connectivity());
    assert_eq!(connection.outcomes_left(), 0);
}

#[test]
fn test_poll_flags_unaligned_start_offset() {
    let connection = ScriptedConnection::default();
    connection.push_reply(0, &[]);
    connection.push_reply(0, &offsets_body(&[0]));
    connection.push_reply(0, &offsets_body(&[100]));
    connection.push_reply(0, &[]);
    let mut client = poll_client(&connection);

    let mut poller = client.partition("orders", 0).poll(PollOptions {
        offset: Some(50),
        ..instant_options()
    });

    let error = poller.next().unwrap().unwrap_err();
    assert!(matches!(error, KafkaError::InvalidOffset(_)));
    assert_eq!(connection.outcomes_left(), 0);
    assert!(poller.next().is_none());
}

#[test]
fn test_poll_at_log_end_yields_empty_batches() {
    let connection = ScriptedConnection::default();
    connection.push_reply(0, &[]);
    connection.push_reply(0, &offsets_body(&[0]));
    connection.push_reply(0, &offsets_body(&[100]));
    let mut client = poll_client(&connection);

    let mut poller = client.partition("orders", 0).poll(PollOptions {
        offset: Some(100),
        ..instant_options()
    });

    // Polling the log end is valid; the empty cycle is still reported.
    let (status, payloads) = poller.next().unwrap().unwrap();
    assert!(payloads.is_empty());
    assert_eq!(status.next_offset, 100);
    assert_eq!(status.last_offset_read, None);
    assert_eq!(status.num_fetches, 1);
    assert_eq!(connection.outcomes_left(), 0);
}

#[test]
fn test_poll_enriches_out_of_range_errors() {
    let connection = ScriptedConnection::default();
    connection.push_reply(1, &[]);
    connection.push_reply(0, &offsets_body(&[5]));
    connection.push_reply(0, &offsets_body(&[50]));
    let mut client = poll_client(&connection);

    let mut poller = client.partition("orders", 0).poll(PollOptions {
        offset: Some(0),
        ..instant_options()
    });

    let error = poller.next().unwrap().unwrap_err();
    assert!(matches!(error, KafkaError::OffsetOutOfRange(_)));
    let message = error.to_string();
    assert!(message.contains("earliest: 5"));
    assert!(message.contains("latest: 50"));
    assert_eq!(connection.outcomes_left(), 0);
}

#[test]
fn test_poll_with_exhausted_range_terminates_immediately() {
    let connection = ScriptedConnection::default();
    let mut client = poll_client(&connection);

    let mut poller = client.partition("orders", 0).poll(PollOptions {
        offset: Some(200),
        end_offset: Some(100),
        ..instant_options()
    });

    assert!(poller.next().is_none());
    assert_eq!(connection.outcomes_left(), 0);
}

#[test]
fn test_poll_accounts_idle_sleep() {
    let connection = ScriptedConnection::default();
    connection.push_reply(0, &[]);
    connection.push_reply(0, &offsets_body(&[0]));
    connection.push_reply(0, &offsets_body(&[0]));
    connection.push_reply(0, &[]);
    let mut client = poll_client(&connection);

    let mut poller = client.partition("orders", 0).poll(PollOptions {
        offset: Some(0),
        poll_interval: Duration::from_millis(10),
        ..PollOptions::default()
    });

    // The empty cycle schedules a sleep but does not take it yet.
    let (status, _) = poller.next().unwrap().unwrap();
    assert_eq!(status.seconds_slept, Duration::ZERO);

    let (status, _) = poller.next().unwrap().unwrap();
    assert_eq!(status.seconds_slept, Duration::from_millis(10));
    assert_eq!(status.num_fetches, 2);
}
