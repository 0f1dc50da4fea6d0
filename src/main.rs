//! Lightdriver - Main Entry Point
//!
//! Wires the configured store, control bus and output device together and
//! hands control to the render loop. Runs until interrupted.

use anyhow::{anyhow, Context};
use lightdriver::bus::{CommandSource, MemoryBus, TcpCommandSource, TcpFrameSink};
use lightdriver::config::{BusEndpoint, DeviceMode, Settings};
use lightdriver::device::{build_device, OutputWorker};
use lightdriver::store::JsonStore;
use lightdriver::telemetry;
use lightdriver::{FrameSink, LightDriver};
use std::sync::atomic::Ordering;

fn main() -> anyhow::Result<()> {
    telemetry::init_logging("info").map_err(|e| anyhow!("{e}"))?;

    let settings = Settings::from_env().context("invalid configuration")?;
    tracing::info!(
        num_leds = settings.num_leds,
        device = ?settings.device,
        bus = ?settings.bus,
        "Starting light driver"
    );

    let store = JsonStore::new(settings.store_path.clone());

    let bus: Box<dyn CommandSource> = match &settings.bus {
        BusEndpoint::Memory => {
            // No external producer: only useful together with AUTO_START
            let (_publisher, source) = MemoryBus::new();
            Box::new(source)
        }
        BusEndpoint::Tcp(addr) => Box::new(TcpCommandSource::bind(addr)?),
    };

    let frame_sink: Option<Box<dyn FrameSink>> =
        if settings.device == DeviceMode::Client {
            let addr = settings
                .colors_addr
                .clone()
                .context("client device needs LIGHTS_COLORS_ADDR")?;
            Some(Box::new(TcpFrameSink::new(addr)))
        } else {
            None
        };

    let device = build_device(&settings, frame_sink)?;
    let output = OutputWorker::spawn(device, settings.scale, settings.repeat)?;

    let mut driver = LightDriver::new(settings, Box::new(store), bus, output);

    let interrupt = driver.interrupt_flag();
    ctrlc::set_handler(move || {
        interrupt.store(true, Ordering::SeqCst);
    })
    .context("failed to install interrupt handler")?;

    driver.run();

    tracing::info!("Cleaning up");
    driver.shutdown();
    Ok(())
}
