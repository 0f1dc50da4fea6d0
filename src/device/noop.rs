//! No-op device for running headless

use super::Device;
use crate::error::Error;

/// Discards every frame; useful for development and as the degraded mode
#[derive(Default)]
pub struct NoopDevice;

impl NoopDevice {
    pub fn new() -> Self {
        Self
    }
}

impl Device for NoopDevice {
    fn init(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn set_color(&mut self, _index: usize, _rgbw: [u8; 4]) {}
}
