//! WS2801 strip over SPI
//!
//! WS2801 chains clock in three bytes per LED straight off the SPI bus, so
//! the whole frame is a single buffered write to the spidev character
//! device followed by a flush. The chip has no white channel; W is dropped
//! at this boundary.

use super::Device;
use crate::error::Error;
use std::fs::{File, OpenOptions};
use std::io::Write;

pub struct Ws2801Device {
    path: String,
    total_leds: usize,
    buffer: Vec<u8>,
    spidev: Option<File>,
}

impl Ws2801Device {
    pub fn new(path: String, total_leds: usize) -> Self {
        Self {
            path,
            total_leds,
            buffer: vec![0u8; total_leds * 3],
            spidev: None,
        }
    }
}

impl Device for Ws2801Device {
    fn init(&mut self) -> Result<(), Error> {
        let spidev = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| Error::device(format!("failed to open {}: {e}", self.path)))?;
        self.spidev = Some(spidev);
        Ok(())
    }

    fn set_color(&mut self, index: usize, rgbw: [u8; 4]) {
        if index >= self.total_leds {
            return;
        }
        let offset = index * 3;
        self.buffer[offset] = rgbw[0];
        self.buffer[offset + 1] = rgbw[1];
        self.buffer[offset + 2] = rgbw[2];
    }

    fn finish(&mut self) {
        let Some(spidev) = self.spidev.as_mut() else {
            return;
        };
        if let Err(e) = spidev.write_all(&self.buffer).and_then(|_| spidev.flush()) {
            tracing::warn!(error = %e, "SPI write failed");
        }
    }

    fn close(&mut self) {
        // Leave the strip dark on the way out
        self.buffer.fill(0);
        self.finish();
        self.spidev = None;
    }
}
