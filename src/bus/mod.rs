//! Control bus
//!
//! Commands arrive as JSON objects on a broker-agnostic transport. The
//! driver blocks on the next command while idle and polls non-destructively
//! while running. A second, one-way frame channel carries base64 pixel
//! blobs in client/server mode.
//!
//! Transports implement `CommandSource` (and `FrameSink` for the frame
//! side); in-memory and TCP JSON-lines implementations ship here.

mod memory;
mod tcp;

pub use memory::{CommandPublisher, MemoryBus, MemoryFrameQueue};
pub use tcp::{TcpCommandSource, TcpFrameSink};

use crate::color::Color;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest accepted color channel name
pub const MAX_CHANNEL_NAME: usize = 30;

/// Seconds between reconnect attempts after a transport loss
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(30);

/// A control message for the render loop
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start { playlist_id: Option<i64> },
    Stop,
    Restart,
    Color { channel: String, color: Color },
}

/// Wire form of a command
#[derive(Serialize, Deserialize)]
struct CommandPayload {
    command: String,
    #[serde(rename = "playlistId", default, skip_serializing_if = "Option::is_none")]
    playlist_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
}

impl Command {
    /// Parse a wire message. Malformed JSON and unknown commands yield
    /// `None` and are ignored by the consumer; malformed color payloads
    /// fall back to safe defaults.
    pub fn parse(raw: &str) -> Option<Command> {
        let payload: CommandPayload = serde_json::from_str(raw).ok()?;
        match payload.command.as_str() {
            "start" => Some(Command::Start {
                playlist_id: payload.playlist_id,
            }),
            "stop" => Some(Command::Stop),
            "restart" => Some(Command::Restart),
            "color" => {
                let channel: String = payload
                    .channel
                    .unwrap_or_default()
                    .chars()
                    .take(MAX_CHANNEL_NAME)
                    .collect();
                let color = Color::from_hex(&payload.color.unwrap_or_default());
                Some(Command::Color { channel, color })
            }
            _ => None,
        }
    }

    /// Serialize to the wire form
    pub fn to_json(&self) -> String {
        let payload = match self {
            Command::Start { playlist_id } => CommandPayload {
                command: "start".to_string(),
                playlist_id: *playlist_id,
                channel: None,
                color: None,
            },
            Command::Stop => CommandPayload {
                command: "stop".to_string(),
                playlist_id: None,
                channel: None,
                color: None,
            },
            Command::Restart => CommandPayload {
                command: "restart".to_string(),
                playlist_id: None,
                channel: None,
                color: None,
            },
            Command::Color { channel, color } => CommandPayload {
                command: "color".to_string(),
                playlist_id: None,
                channel: Some(channel.clone()),
                color: Some(color.to_hex_web()),
            },
        };
        serde_json::to_string(&payload).unwrap_or_default()
    }
}

/// Consumer side of the command queue
pub trait CommandSource: Send {
    /// Wait up to `timeout` for the next command
    fn recv_timeout(&mut self, timeout: Duration) -> Option<Command>;

    /// Single non-blocking poll
    fn try_recv(&mut self) -> Option<Command>;

    /// Drop anything already queued (used once at startup)
    fn purge(&mut self) {
        while self.try_recv().is_some() {}
    }
}

/// Producer side of the frame channel
///
/// Publishing never fails loudly: on transport loss the frame is dropped
/// and the connection retried later.
pub trait FrameSink: Send {
    fn publish(&mut self, data: &[u8]);

    /// Queue depth, when the transport has one
    fn depth(&self) -> Option<usize> {
        None
    }

    /// Throw away everything queued
    fn purge(&mut self) {}
}
