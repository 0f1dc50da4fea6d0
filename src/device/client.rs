//! Client-mode device
//!
//! In server mode the render host has no strip of its own; frames are
//! base64-encoded and published to the colors queue for a remote client to
//! display. Scale and repeat are the client's business, so the logical
//! frame goes out as-is: three bytes (r, g, b) per pixel.

use super::Device;
use crate::bus::FrameSink;
use crate::error::Error;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Queue depth beyond which the backlog is thrown away
const PURGE_DEPTH: usize = 4000;
/// How many publishes go between depth checks
const PURGE_CHECK_INTERVAL: usize = 5000;

pub struct ClientDevice {
    sink: Box<dyn FrameSink>,
    num_leds: usize,
    messages_since_check: usize,
}

impl ClientDevice {
    pub fn new(sink: Box<dyn FrameSink>, num_leds: usize) -> Self {
        Self {
            sink,
            num_leds,
            messages_since_check: 0,
        }
    }

    fn pack(&self, colors: &[[u8; 4]]) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.num_leds * 3);
        for color in colors.iter().take(self.num_leds) {
            data.extend_from_slice(&color[..3]);
        }
        data
    }
}

impl Device for ClientDevice {
    fn init(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn set_color(&mut self, _index: usize, _rgbw: [u8; 4]) {}

    fn show_frame(&mut self, colors: &[[u8; 4]], _scale: usize, _repeat: usize) {
        // With no consumer attached the queue would grow without bound;
        // drop the backlog once it passes the high-water mark
        if self.messages_since_check > PURGE_CHECK_INTERVAL {
            self.messages_since_check = 0;
            if let Some(depth) = self.sink.depth() {
                if depth > PURGE_DEPTH {
                    tracing::warn!(depth, "Colors queue over high-water mark, purging");
                    self.sink.purge();
                }
            }
        }

        let encoded = STANDARD.encode(self.pack(colors));
        self.sink.publish(encoded.as_bytes());
        self.messages_since_check += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MemoryFrameQueue;

    #[test]
    fn test_frames_published_base64() {
        let queue = MemoryFrameQueue::new();
        let mut device = ClientDevice::new(Box::new(queue.clone()), 2);

        device.show_frame(&[[255, 0, 128, 0], [1, 2, 3, 0]], 1, 1);

        let raw = queue.pop().expect("frame published");
        let decoded = STANDARD.decode(raw).unwrap();
        assert_eq!(decoded, vec![255, 0, 128, 1, 2, 3]);
    }

    #[test]
    fn test_payload_is_3n_bytes() {
        let queue = MemoryFrameQueue::new();
        let mut device = ClientDevice::new(Box::new(queue.clone()), 4);
        device.show_frame(&[[9, 9, 9, 9]; 4], 2, 3);
        let decoded = STANDARD.decode(queue.pop().unwrap()).unwrap();
        // Scale and repeat do not inflate the published frame
        assert_eq!(decoded.len(), 12);
    }

    #[test]
    fn test_backlog_purged_past_high_water() {
        let queue = MemoryFrameQueue::new();
        let mut device = ClientDevice::new(Box::new(queue.clone()), 1);

        for _ in 0..(PURGE_CHECK_INTERVAL + 2) {
            device.show_frame(&[[0, 0, 0, 0]], 1, 1);
        }
        // The depth check fired once past the interval and found the queue
        // over the mark
        assert!(queue.len() < PURGE_CHECK_INTERVAL);
    }
}
