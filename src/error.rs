//! Error taxonomy for the render engine
//!
//! Configuration and store errors are fatal at run start; everything else
//! degrades locally and never escapes the render loop.

use thiserror::Error;

/// Top-level library error
#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing configuration (unknown device, unparseable env value)
    #[error("config error: {0}")]
    Config(String),

    /// A persisted run input could not be loaded or parsed
    #[error("store error: {0}")]
    Store(String),

    /// The output device failed to initialize or write
    #[error("device error: {0}")]
    Device(String),

    /// The control bus endpoint could not be set up
    #[error("bus error: {0}")]
    Bus(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Error::Store(msg.into())
    }

    pub fn device(msg: impl Into<String>) -> Self {
        Error::Device(msg.into())
    }

    pub fn bus(msg: impl Into<String>) -> Self {
        Error::Bus(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Device(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Store(err.to_string())
    }
}
