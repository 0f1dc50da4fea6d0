//! Lightdriver Library
//!
//! A real-time render engine for addressable LED strips. Each frame, a base
//! color buffer is run through an ordered pipeline of color transforms whose
//! parameters may be driven by live variables (random, ADC, audio FFT, color
//! channels), then corrected and handed to an output worker that owns the
//! physical device.

pub mod audio;
pub mod bus;
pub mod color;
pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod params;
pub mod store;
pub mod telemetry;
pub mod transforms;
pub mod variables;

pub use bus::{Command, CommandSource, FrameSink, MemoryBus};
pub use color::{BlendMode, Color, Correction};
pub use config::{BusEndpoint, DeviceMode, Settings};
pub use device::{Device, OutputWorker};
pub use driver::LightDriver;
pub use error::Error;
pub use params::{ParamDef, ParamSet, ParamType, ParamValue, ParamsDef};
pub use store::{ConfigStore, JsonStore, PlaylistDocument, RunDocument, TransformSpec, VariableSpec};
pub use transforms::{Transform, TransformDefinition, TransformRegistry};
pub use variables::{Variable, VariableDefinition, VariableRegistry, VariableTable};
