//! Audio capture and beat analysis
//!
//! A background worker owns the capture stream and publishes a single
//! normalized beat envelope value; the audio variable on the render thread
//! only ever reads that cell. Worker and consumer share exactly one value
//! cell and one exit flag.

mod worker;

pub use worker::AudioWorker;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Capture chunk size in samples
pub const CHUNK: usize = 1024;

/// State shared between the analysis worker and the audio variable
pub struct AudioShared {
    value: AtomicU64,
    exit: AtomicBool,
}

impl Default for AudioShared {
    fn default() -> Self {
        Self {
            value: AtomicU64::new(0.0f64.to_bits()),
            exit: AtomicBool::new(false),
        }
    }
}

impl AudioShared {
    pub fn value(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Relaxed))
    }

    pub fn set_value(&self, value: f64) {
        self.value.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn exit_requested(&self) -> bool {
        self.exit.load(Ordering::Relaxed)
    }

    pub fn request_exit(&self) {
        self.exit.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_value_round_trip() {
        let shared = AudioShared::default();
        assert_eq!(shared.value(), 0.0);
        shared.set_value(0.625);
        assert_eq!(shared.value(), 0.625);
    }

    #[test]
    fn test_exit_flag() {
        let shared = AudioShared::default();
        assert!(!shared.exit_requested());
        shared.request_exit();
        assert!(shared.exit_requested());
    }
}
