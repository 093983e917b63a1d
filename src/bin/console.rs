use std::time::Duration;

use clap::Parser;
use dotenv::dotenv;
use flintmq::{
    setup_local_tracing, ClientConfig, FetchedMessage, KafkaClient, KafkaResult, Message,
    PollOptions, DEFAULT_PARTITION, LATEST_OFFSET,
};

#[derive(Parser)]
#[command(version)]
pub struct CommandLine {
    /// path to config file
    #[arg(short, long)]
    pub conf: Option<String>,
    #[command(subcommand)]
    pub command: Command,
    /// log level (v: info, vv: debug, vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Parser)]
pub enum Command {
    /// append messages to a topic-partition
    Produce {
        topic: String,
        #[arg(short, long, default_value_t = DEFAULT_PARTITION)]
        partition: u32,
        /// message payloads, one per argument
        messages: Vec<String>,
    },
    /// read messages once, starting at a byte offset
    Fetch {
        topic: String,
        #[arg(short, long, default_value_t = DEFAULT_PARTITION)]
        partition: u32,
        #[arg(short, long, default_value_t = 0)]
        offset: u64,
        #[arg(short, long)]
        max_size: Option<u32>,
    },
    /// query known offsets at or before a time value
    Offsets {
        topic: String,
        #[arg(short, long, default_value_t = DEFAULT_PARTITION)]
        partition: u32,
        /// milliseconds since epoch, -1 for latest, -2 for earliest
        #[arg(short, long, default_value_t = LATEST_OFFSET, allow_negative_numbers = true)]
        time: i64,
        #[arg(short, long, default_value_t = 1)]
        max: u32,
    },
    /// poll a topic-partition continuously
    Tail {
        topic: String,
        #[arg(short, long, default_value_t = DEFAULT_PARTITION)]
        partition: u32,
        /// byte offset to start from; omit to start at the log end
        #[arg(short, long)]
        offset: Option<u64>,
        #[arg(short, long)]
        end_offset: Option<u64>,
        /// seconds to wait between empty fetches
        #[arg(short, long, default_value_t = 1)]
        interval: u64,
    },
}

fn main() -> KafkaResult<()> {
    dotenv().ok();

    let commandline: CommandLine = CommandLine::parse();
    if commandline.verbose > 0 {
        let level = match commandline.verbose {
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }
    setup_local_tracing()?;

    let config = match &commandline.conf {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    let mut client = KafkaClient::new(config);

    match commandline.command {
        Command::Produce {
            topic,
            partition,
            messages,
        } => {
            let messages: Vec<Message> = messages.into_iter().map(Message::from).collect();
            client.produce(&topic, &messages, partition)?;
            println!(
                "produced {} messages to {}-{}",
                messages.len(),
                topic,
                partition
            );
        }
        Command::Fetch {
            topic,
            partition,
            offset,
            max_size,
        } => {
            for message in client.fetch(&topic, offset, partition, max_size)? {
                print_message(&message);
            }
        }
        Command::Offsets {
            topic,
            partition,
            time,
            max,
        } => {
            for offset in client.offsets(&topic, time, max, partition)? {
                println!("{}", offset);
            }
        }
        Command::Tail {
            topic,
            partition,
            offset,
            end_offset,
            interval,
        } => {
            let options = PollOptions {
                offset,
                end_offset,
                poll_interval: Duration::from_secs(interval),
                ..PollOptions::default()
            };
            for item in client.partition(topic, partition).poll(options) {
                let (status, payloads) = item?;
                for payload in &payloads {
                    println!("{}", String::from_utf8_lossy(payload));
                }
                eprintln!(
                    "-- {} messages, {} bytes, next offset {}",
                    status.messages_read, status.bytes_read, status.next_offset
                );
            }
        }
    }
    Ok(())
}

fn print_message(message: &FetchedMessage) {
    if message.corrupt {
        println!(
            "[corrupt @ {}] {} bytes",
            message.offset,
            message.payload.len()
        );
    } else {
        println!("{}", String::from_utf8_lossy(&message.payload));
    }
}
