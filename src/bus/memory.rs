//! In-process bus transports
//!
//! Used when everything runs in one process (AUTO_START setups, tests, and
//! the embedding API). The frame queue doubles as the broker the client
//! device publishes into, so it exposes depth and purge.

use super::{Command, CommandSource, FrameSink};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Producer handle for in-process commands
#[derive(Clone)]
pub struct CommandPublisher {
    sender: Sender<Command>,
}

impl CommandPublisher {
    pub fn publish(&self, command: Command) {
        let _ = self.sender.send(command);
    }
}

/// Consumer half of the in-process command queue
pub struct MemoryBus {
    receiver: Receiver<Command>,
}

impl MemoryBus {
    pub fn new() -> (CommandPublisher, MemoryBus) {
        let (sender, receiver) = unbounded();
        (CommandPublisher { sender }, MemoryBus { receiver })
    }
}

impl CommandSource for MemoryBus {
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

/// In-process frame queue with broker-style depth and purge
#[derive(Clone, Default)]
pub struct MemoryFrameQueue {
    frames: Arc<Mutex<VecDeque<Vec<u8>>>>,
}

impl MemoryFrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the oldest queued frame
    pub fn pop(&self) -> Option<Vec<u8>> {
        self.frames.lock().ok()?.pop_front()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FrameSink for MemoryFrameQueue {
    fn publish(&mut self, data: &[u8]) {
        if let Ok(mut queue) = self.frames.lock() {
            queue.push_back(data.to_vec());
        }
    }

    fn depth(&self) -> Option<usize> {
        Some(self.len())
    }

    fn purge(&mut self) {
        if let Ok(mut queue) = self.frames.lock() {
            queue.clear();
        }
    }
}
