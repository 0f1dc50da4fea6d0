//! WS281x strip via the rpi_ws281x DMA driver

use super::Device;
use crate::error::Error;
use rs_ws281x::{ChannelBuilder, Controller, ControllerBuilder, StripType};

/// GPIO pin carrying the data line
const DATA_PIN: i32 = 18;

const FREQUENCY: u32 = 800_000;
const DMA_CHANNEL: i32 = 10;

pub struct Ws281xDevice {
    total_leds: usize,
    controller: Option<Controller>,
}

impl Ws281xDevice {
    pub fn new(total_leds: usize) -> Self {
        Self {
            total_leds,
            controller: None,
        }
    }
}

impl Device for Ws281xDevice {
    fn init(&mut self) -> Result<(), Error> {
        let controller = ControllerBuilder::new()
            .freq(FREQUENCY)
            .dma(DMA_CHANNEL)
            .channel(
                0,
                ChannelBuilder::new()
                    .pin(DATA_PIN)
                    .count(self.total_leds as i32)
                    .strip_type(StripType::Sk6812Grbw)
                    .brightness(255)
                    .build(),
            )
            .build()
            .map_err(|e| Error::device(format!("ws281x init failed: {e}")))?;
        self.controller = Some(controller);
        Ok(())
    }

    fn set_color(&mut self, index: usize, rgbw: [u8; 4]) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        let leds = controller.leds_mut(0);
        if let Some(led) = leds.get_mut(index) {
            // Library LED order is [B, G, R, W]
            *led = [rgbw[2], rgbw[1], rgbw[0], rgbw[3]];
        }
    }

    fn finish(&mut self) {
        if let Some(controller) = self.controller.as_mut() {
            if let Err(e) = controller.render() {
                tracing::warn!(error = %e, "ws281x render failed");
            }
        }
    }

    fn close(&mut self) {
        if let Some(controller) = self.controller.as_mut() {
            for led in controller.leds_mut(0) {
                *led = [0, 0, 0, 0];
            }
            let _ = controller.render();
        }
        self.controller = None;
    }
}
