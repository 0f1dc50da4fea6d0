//! Output devices and the output worker
//!
//! A device owns the physical strip (or its network stand-in). The output
//! worker runs on its own thread, connected to the render loop by a single
//! one-way bounded channel: `Some(frame)` shows a frame, `None` closes the
//! device and ends the worker. The bounded channel is the backpressure:
//! a slow device paces the render loop instead of queueing frames.

mod client;
mod noop;
mod ws2801;
#[cfg(feature = "ws281x")]
mod ws281x;

pub use client::ClientDevice;
pub use noop::NoopDevice;
pub use ws2801::Ws2801Device;

use crate::config::{DeviceMode, Settings};
use crate::error::Error;
use crate::FrameSink;
use crossbeam_channel::{bounded, Sender};
use std::thread::JoinHandle;

/// One packed output frame: per logical pixel (r, g, b, w) bytes
pub type Frame = Vec<[u8; 4]>;

/// An LED output device
pub trait Device: Send {
    fn init(&mut self) -> Result<(), Error>;

    /// Write one physical LED
    fn set_color(&mut self, index: usize, rgbw: [u8; 4]);

    /// Push written colors to the hardware
    fn finish(&mut self) {}

    /// Display a logical frame: each pixel expands to `scale` adjacent
    /// physical LEDs and the whole strip repeats `repeat` times.
    fn show_frame(&mut self, colors: &[[u8; 4]], scale: usize, repeat: usize) {
        let per_repeat = colors.len() * scale;
        for r in 0..repeat {
            for (i, &color) in colors.iter().enumerate() {
                for s in 0..scale {
                    self.set_color(r * per_repeat + i * scale + s, color);
                }
            }
        }
        self.finish();
    }

    fn close(&mut self) {}
}

/// Build the configured device. Unknown modes are already rejected at
/// config parse; this fails when a mode needs wiring the build lacks.
pub fn build_device(
    settings: &Settings,
    frame_sink: Option<Box<dyn FrameSink>>,
) -> Result<Box<dyn Device>, Error> {
    let total_leds = settings.num_leds * settings.scale * settings.repeat;
    match settings.device {
        DeviceMode::Noop => Ok(Box::new(NoopDevice::new())),
        DeviceMode::Ws2801 => Ok(Box::new(Ws2801Device::new(
            settings.dev_name.clone(),
            total_leds,
        ))),
        DeviceMode::Ws281x => {
            #[cfg(feature = "ws281x")]
            {
                Ok(Box::new(ws281x::Ws281xDevice::new(total_leds)))
            }
            #[cfg(not(feature = "ws281x"))]
            {
                Err(Error::config(
                    "ws281x device requires building with the 'ws281x' feature",
                ))
            }
        }
        DeviceMode::Client => {
            let sink = frame_sink.ok_or_else(|| {
                Error::config("client device needs a frame sink (set LIGHTS_COLORS_ADDR)")
            })?;
            Ok(Box::new(ClientDevice::new(sink, settings.num_leds)))
        }
    }
}

/// Background thread owning the device
pub struct OutputWorker {
    sender: Sender<Option<Frame>>,
    handle: Option<JoinHandle<()>>,
}

impl OutputWorker {
    pub fn spawn(
        mut device: Box<dyn Device>,
        scale: usize,
        repeat: usize,
    ) -> Result<Self, Error> {
        let (sender, receiver) = bounded::<Option<Frame>>(1);
        let handle = std::thread::Builder::new()
            .name("output-worker".to_string())
            .spawn(move || {
                // An unusable device degrades to a sink that drains frames,
                // keeping the render loop paced and alive
                let ready = match device.init() {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::error!(error = %e, "Output device failed to initialize");
                        false
                    }
                };

                for message in receiver.iter() {
                    match message {
                        Some(frame) => {
                            if ready {
                                device.show_frame(&frame, scale, repeat);
                            }
                        }
                        None => break,
                    }
                }
                device.close();
                tracing::info!("Closed light device");
            })
            .map_err(|e| Error::device(format!("failed to spawn output worker: {e}")))?;

        Ok(Self {
            sender,
            handle: Some(handle),
        })
    }

    /// Send a frame, blocking while the device is busy with the previous
    /// one. Returns false when the worker is gone.
    pub fn send(&self, frame: Frame) -> bool {
        self.sender.send(Some(frame)).is_ok()
    }

    /// Send the close sentinel and wait for the worker to finish
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.sender.send(None);
            let _ = handle.join();
        }
    }
}

impl Drop for OutputWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Test device capturing logical frames and lifecycle events
    #[derive(Clone, Default)]
    pub struct CaptureDevice {
        pub frames: Arc<Mutex<Vec<Frame>>>,
        pub closed: Arc<AtomicBool>,
        pub delay: Option<Duration>,
    }

    impl Device for CaptureDevice {
        fn init(&mut self) -> Result<(), Error> {
            Ok(())
        }

        fn set_color(&mut self, _index: usize, _rgbw: [u8; 4]) {}

        fn show_frame(&mut self, colors: &[[u8; 4]], _scale: usize, _repeat: usize) {
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            if let Ok(mut frames) = self.frames.lock() {
                frames.push(colors.to_vec());
            }
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }
}
