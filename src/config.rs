//! Runtime settings
//!
//! The core is configured entirely through `LIGHTS_*` environment keys; the
//! external management surface owns everything else. Parse failures are
//! config errors and fatal at startup.

use crate::color::Correction;
use crate::error::Error;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Output device selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    Noop,
    Client,
    Ws2801,
    Ws281x,
}

impl FromStr for DeviceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "noop" => Ok(DeviceMode::Noop),
            "client" => Ok(DeviceMode::Client),
            "ws2801" => Ok(DeviceMode::Ws2801),
            "ws281x" => Ok(DeviceMode::Ws281x),
            other => Err(Error::config(format!("unknown device '{other}'"))),
        }
    }
}

/// Control bus endpoint selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEndpoint {
    /// In-process bus; useful with AUTO_START and for tests
    Memory,
    /// JSON-lines listener on the given address
    Tcp(String),
}

impl FromStr for BusEndpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s == "memory" {
            Ok(BusEndpoint::Memory)
        } else if let Some(addr) = s.strip_prefix("tcp:") {
            Ok(BusEndpoint::Tcp(addr.to_string()))
        } else {
            Err(Error::config(format!("unknown bus endpoint '{s}'")))
        }
    }
}

/// Tuning for the audio beat-detection worker
#[derive(Debug, Clone, Copy)]
pub struct AudioSettings {
    /// Rolling analysis window in seconds
    pub duration: f64,
    /// Only bins below this frequency contribute to the beat estimate
    pub lpf_freq: f64,
    pub short_term_weight: f64,
    pub long_term_weight: f64,
    pub ratio_cutoff: f64,
    pub ratio_multiplier: f64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            duration: 0.03,
            lpf_freq: 90.0,
            short_term_weight: 0.2,
            long_term_weight: 0.995,
            ratio_cutoff: 1.0,
            ratio_multiplier: 1.0,
        }
    }
}

/// Complete core configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub num_leds: usize,
    /// Physical LEDs per logical pixel
    pub scale: usize,
    /// Times the whole strip is repeated end-to-end
    pub repeat: usize,
    pub device: DeviceMode,
    /// Target seconds per frame
    pub update_interval: f64,
    /// Seconds between command polls while running
    pub message_check_interval: f64,
    pub correction: Correction,
    pub auto_start: bool,
    pub enable_audio_var: bool,
    pub enable_adc: bool,
    pub driver_debug: bool,
    /// SPI device path for ws2801
    pub dev_name: String,
    /// Directory holding the persisted run/playlist documents
    pub store_path: PathBuf,
    pub bus: BusEndpoint,
    /// Peer address frames are published to in client mode
    pub colors_addr: Option<String>,
    pub audio: AudioSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            num_leds: 50,
            scale: 1,
            repeat: 1,
            device: DeviceMode::Noop,
            update_interval: 0.05,
            message_check_interval: 0.5,
            correction: Correction::default(),
            auto_start: false,
            enable_audio_var: false,
            enable_adc: false,
            driver_debug: false,
            dev_name: "/dev/spidev0.0".to_string(),
            store_path: PathBuf::from("store"),
            bus: BusEndpoint::Memory,
            colors_addr: None,
            audio: AudioSettings::default(),
        }
    }
}

fn read<T: FromStr>(key: &str, current: T) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::config(format!("{key}={raw}: {e}"))),
        Err(_) => Ok(current),
    }
}

fn read_flag(key: &str, current: bool) -> bool {
    match env::var(key) {
        Ok(raw) => matches!(raw.as_str(), "1" | "true" | "True" | "yes" | "on"),
        Err(_) => current,
    }
}

impl Settings {
    /// Build settings from the environment on top of the defaults
    pub fn from_env() -> Result<Self, Error> {
        let defaults = Settings::default();
        let mut settings = Settings {
            num_leds: read("LIGHTS_NUM_LEDS", defaults.num_leds)?,
            scale: read("LIGHTS_SCALE", defaults.scale)?,
            repeat: read("LIGHTS_REPEAT", defaults.repeat)?,
            device: read("LIGHTS_DEVICE", defaults.device)?,
            update_interval: read("LIGHTS_UPDATE_INTERVAL", defaults.update_interval)?,
            message_check_interval: read(
                "LIGHTS_MESSAGE_CHECK_INTERVAL",
                defaults.message_check_interval,
            )?,
            correction: Correction {
                r: read("LIGHTS_MULTIPLIER_R", 1.0)?,
                g: read("LIGHTS_MULTIPLIER_G", 1.0)?,
                b: read("LIGHTS_MULTIPLIER_B", 1.0)?,
                w: read("LIGHTS_MULTIPLIER_W", 1.0)?,
            },
            auto_start: read_flag("AUTO_START", defaults.auto_start),
            enable_audio_var: read_flag("ENABLE_AUDIO_VAR", defaults.enable_audio_var),
            enable_adc: read_flag("ENABLE_ADC", defaults.enable_adc),
            driver_debug: read_flag("LIGHTS_DRIVER_DEBUG", defaults.driver_debug),
            dev_name: read("LIGHTS_DEV_NAME", defaults.dev_name)?,
            store_path: read("LIGHTS_STORE_PATH", defaults.store_path)?,
            bus: read("LIGHTS_BUS", defaults.bus)?,
            colors_addr: env::var("LIGHTS_COLORS_ADDR").ok(),
            audio: AudioSettings {
                duration: read("LIGHTS_AUDIO_DURATION", defaults.audio.duration)?,
                lpf_freq: read("LIGHTS_AUDIO_LPF_FREQ", defaults.audio.lpf_freq)?,
                short_term_weight: read(
                    "LIGHTS_AUDIO_SHORT_TERM_WEIGHT",
                    defaults.audio.short_term_weight,
                )?,
                long_term_weight: read(
                    "LIGHTS_AUDIO_LONG_TERM_WEIGHT",
                    defaults.audio.long_term_weight,
                )?,
                ratio_cutoff: read("LIGHTS_AUDIO_RATIO_CUTOFF", defaults.audio.ratio_cutoff)?,
                ratio_multiplier: read(
                    "LIGHTS_AUDIO_RATIO_MULTIPLIER",
                    defaults.audio.ratio_multiplier,
                )?,
            },
        };

        if settings.num_leds == 0 {
            return Err(Error::config("LIGHTS_NUM_LEDS must be at least 1"));
        }
        settings.scale = settings.scale.max(1);
        settings.repeat = settings.repeat.max(1);
        if settings.update_interval <= 0.0 {
            settings.update_interval = defaults.update_interval;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_mode_parse() {
        assert_eq!("noop".parse::<DeviceMode>().unwrap(), DeviceMode::Noop);
        assert_eq!("ws2801".parse::<DeviceMode>().unwrap(), DeviceMode::Ws2801);
        assert!("ws9999".parse::<DeviceMode>().is_err());
    }

    #[test]
    fn test_bus_endpoint_parse() {
        assert_eq!("memory".parse::<BusEndpoint>().unwrap(), BusEndpoint::Memory);
        assert_eq!(
            "tcp:127.0.0.1:5600".parse::<BusEndpoint>().unwrap(),
            BusEndpoint::Tcp("127.0.0.1:5600".to_string())
        );
        assert!("amqp://x".parse::<BusEndpoint>().is_err());
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.num_leds, 50);
        assert_eq!(s.update_interval, 0.05);
        assert_eq!(s.message_check_interval, 0.5);
        assert!(!s.auto_start);
    }
}
