//! TCP JSON-lines transports
//!
//! The command listener accepts any number of producers and feeds their
//! newline-delimited JSON commands into one queue. The frame sink is a
//! single outbound connection that silently drops frames while the peer is
//! away and retries with a fixed backoff.

use super::{Command, CommandSource, FrameSink, RECONNECT_BACKOFF};
use crate::error::Error;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

/// Command listener on a TCP address
pub struct TcpCommandSource {
    receiver: Receiver<Command>,
    local_addr: std::net::SocketAddr,
}

impl TcpCommandSource {
    /// Bind the listener and start accepting producers
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| Error::bus(format!("failed to bind {addr}: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| Error::bus(format!("failed to resolve {addr}: {e}")))?;
        let (sender, receiver) = unbounded();

        let addr = addr.to_string();
        std::thread::Builder::new()
            .name("bus-listener".to_string())
            .spawn(move || accept_loop(listener, sender, addr))
            .map_err(|e| Error::bus(format!("failed to spawn bus listener: {e}")))?;

        Ok(Self {
            receiver,
            local_addr,
        })
    }

    /// The bound address, useful when binding port 0
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.local_addr
    }
}

fn accept_loop(listener: TcpListener, sender: Sender<Command>, addr: String) {
    tracing::info!(%addr, "Command bus listening");
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "Bus accept failed, retrying");
                std::thread::sleep(RECONNECT_BACKOFF);
                continue;
            }
        };
        let sender = sender.clone();
        let _ = std::thread::Builder::new()
            .name("bus-reader".to_string())
            .spawn(move || read_commands(stream, sender));
    }
}

fn read_commands(stream: TcpStream, sender: Sender<Command>) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        match Command::parse(&line) {
            Some(command) => {
                if sender.send(command).is_err() {
                    return;
                }
            }
            None => tracing::debug!(%peer, "Ignoring malformed command"),
        }
    }
    tracing::debug!(%peer, "Command producer disconnected");
}

impl CommandSource for TcpCommandSource {
    fn recv_timeout(&mut self, timeout: Duration) -> Option<Command> {
        self.receiver.recv_timeout(timeout).ok()
    }

    fn try_recv(&mut self) -> Option<Command> {
        match self.receiver.try_recv() {
            Ok(command) => Some(command),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// Outbound frame connection for server mode
pub struct TcpFrameSink {
    addr: String,
    connection: Option<TcpStream>,
    last_attempt: Option<Instant>,
}

impl TcpFrameSink {
    /// Create the sink; the connection is established lazily so a missing
    /// peer never blocks startup
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connection: None,
            last_attempt: None,
        }
    }

    fn ensure_connection(&mut self) -> Option<&mut TcpStream> {
        if self.connection.is_none() {
            let due = self
                .last_attempt
                .map(|at| at.elapsed() >= RECONNECT_BACKOFF)
                .unwrap_or(true);
            if !due {
                return None;
            }
            self.last_attempt = Some(Instant::now());
            match TcpStream::connect(&self.addr) {
                Ok(stream) => {
                    tracing::info!(addr = %self.addr, "Frame sink connected");
                    self.connection = Some(stream);
                }
                Err(e) => {
                    tracing::debug!(addr = %self.addr, error = %e, "Frame sink connect failed");
                    return None;
                }
            }
        }
        self.connection.as_mut()
    }
}

impl FrameSink for TcpFrameSink {
    fn publish(&mut self, data: &[u8]) {
        let Some(stream) = self.ensure_connection() else {
            return;
        };
        let failed = stream
            .write_all(data)
            .and_then(|_| stream.write_all(b"\n"))
            .is_err();
        if failed {
            tracing::debug!(addr = %self.addr, "Frame sink dropped connection");
            self.connection = None;
        }
    }
}
