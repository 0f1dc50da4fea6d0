//! Audio analysis worker
//!
//! Captures mono PCM, keeps a short rolling window, and estimates a
//! low-frequency beat envelope from the FFT of the Blackman-windowed
//! samples. The estimate is published as the ratio of a short-term average
//! over a long-term average, so steady background levels settle to zero and
//! transients spike toward one.

use super::{AudioShared, CHUNK};
use crate::config::AudioSettings;
use crate::error::Error;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rustfft::{num_complex::Complex, FftPlanner};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Handle to the background capture/analysis thread
pub struct AudioWorker {
    shared: Arc<AudioShared>,
    handle: Option<JoinHandle<()>>,
}

impl AudioWorker {
    /// Start the worker. Fails when no capture device is available; the
    /// caller is expected to degrade rather than propagate.
    pub fn spawn(settings: AudioSettings, update_interval: f64) -> Result<Self, Error> {
        let shared = Arc::new(AudioShared::default());
        let worker_shared = Arc::clone(&shared);

        // The stream must be created on the thread that owns it, so device
        // setup failures are reported back over a channel.
        let (ready_tx, ready_rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("audio-worker".to_string())
            .spawn(move || worker_main(worker_shared, settings, update_interval, ready_tx))
            .map_err(|e| Error::config(format!("failed to spawn audio worker: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                shared,
                handle: Some(handle),
            }),
            Ok(Err(msg)) => {
                let _ = handle.join();
                Err(Error::config(msg))
            }
            Err(_) => {
                let _ = handle.join();
                Err(Error::config("audio worker died during setup"))
            }
        }
    }

    pub fn shared(&self) -> Arc<AudioShared> {
        Arc::clone(&self.shared)
    }

    /// Signal the worker to exit and wait for it; idempotent
    pub fn stop(&mut self) {
        self.shared.request_exit();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AudioWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_main(
    shared: Arc<AudioShared>,
    settings: AudioSettings,
    update_interval: f64,
    ready_tx: mpsc::Sender<Result<(), String>>,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        let _ = ready_tx.send(Err("no default audio input device".to_string()));
        return;
    };
    let config = match device.default_input_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("failed to get input config: {e}")));
            return;
        }
    };

    let sample_rate = config.sample_rate().0 as f64;
    let channels = config.channels() as usize;
    let capture: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
    let running = Arc::new(AtomicBool::new(true));

    let err_fn = |err| tracing::error!("Audio input error: {}", err);

    let stream = {
        let capture = Arc::clone(&capture);
        let running = Arc::clone(&running);
        match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if running.load(Ordering::Relaxed) {
                        push_mono(&capture, data.iter().map(|&s| f64::from(s)), channels);
                    }
                },
                err_fn,
                None,
            ),
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if running.load(Ordering::Relaxed) {
                        let max = f64::from(i16::MAX);
                        push_mono(&capture, data.iter().map(|&s| f64::from(s) / max), channels);
                    }
                },
                err_fn,
                None,
            ),
            cpal::SampleFormat::U16 => device.build_input_stream(
                &config.into(),
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    if running.load(Ordering::Relaxed) {
                        let max = f64::from(u16::MAX);
                        push_mono(
                            &capture,
                            data.iter().map(|&s| f64::from(s) / max * 2.0 - 1.0),
                            channels,
                        );
                    }
                },
                err_fn,
                None,
            ),
            other => {
                let _ = ready_tx.send(Err(format!("unsupported sample format: {other:?}")));
                return;
            }
        }
    };

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("failed to build stream: {e}")));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(format!("failed to start stream: {e}")));
        return;
    }
    let _ = ready_tx.send(Ok(()));
    tracing::info!(sample_rate, "Audio worker capturing");

    let mut analyzer = BeatAnalyzer::new(settings, sample_rate);
    let interval = Duration::from_secs_f64(update_interval.max(0.001));

    while !shared.exit_requested() {
        let tick_start = Instant::now();

        let drained: Vec<f64> = {
            let mut buffer = match capture.lock() {
                Ok(buffer) => buffer,
                Err(_) => break,
            };
            std::mem::take(&mut *buffer)
        };
        if let Some(value) = analyzer.feed(&drained) {
            shared.set_value(value);
        }

        // Analysis beyond the render rate is wasted work
        if let Some(sleep) = interval.checked_sub(tick_start.elapsed()) {
            std::thread::sleep(sleep);
        }
    }

    running.store(false, Ordering::Relaxed);
    drop(stream);
    tracing::info!("Closed audio device");
}

/// Downmix interleaved samples to mono and append to the capture buffer
fn push_mono(
    capture: &Arc<Mutex<Vec<f64>>>,
    samples: impl Iterator<Item = f64>,
    channels: usize,
) {
    let Ok(mut buffer) = capture.lock() else {
        return;
    };
    if channels <= 1 {
        buffer.extend(samples);
        return;
    }
    let mut frame = Vec::with_capacity(channels);
    for sample in samples {
        frame.push(sample);
        if frame.len() == channels {
            buffer.push(frame.iter().sum::<f64>() / channels as f64);
            frame.clear();
        }
    }
}

/// Rolling-window FFT beat estimator
struct BeatAnalyzer {
    settings: AudioSettings,
    window: Vec<f64>,
    blackman: Vec<f64>,
    planner: FftPlanner<f64>,
    scratch: Vec<Complex<f64>>,
    audio_samples: usize,
    /// Number of leading FFT bins below the low-pass cutoff
    total_ffts: usize,
    val: f64,
    long_term: f64,
}

impl BeatAnalyzer {
    fn new(settings: AudioSettings, sample_rate: f64) -> Self {
        let audio_samples = ((sample_rate * settings.duration) as usize).max(CHUNK / 4);

        // Bin k sits at frequency k * rate / n; keep everything below the
        // low-pass cutoff
        let mut total_ffts = 0;
        for k in 0..=audio_samples / 2 {
            if (k as f64) * sample_rate / audio_samples as f64 >= settings.lpf_freq {
                break;
            }
            total_ffts += 1;
        }
        let total_ffts = total_ffts.max(1);

        let m = (audio_samples - 1) as f64;
        let blackman = (0..audio_samples)
            .map(|i| {
                let x = i as f64 / m;
                0.42 - 0.5 * (2.0 * std::f64::consts::PI * x).cos()
                    + 0.08 * (4.0 * std::f64::consts::PI * x).cos()
            })
            .collect();

        Self {
            settings,
            window: Vec::new(),
            blackman,
            planner: FftPlanner::new(),
            scratch: vec![Complex::new(0.0, 0.0); audio_samples],
            audio_samples,
            total_ffts,
            val: 1.0,
            long_term: 1.0,
        }
    }

    /// Feed newly captured samples; returns a fresh normalized beat value
    /// once the window is full
    fn feed(&mut self, samples: &[f64]) -> Option<f64> {
        self.window.extend_from_slice(samples);

        if self.window.len() < self.audio_samples {
            self.val = 1.0;
            return None;
        }

        // Keep only the most recent window
        let excess = self.window.len() - self.audio_samples;
        self.window.drain(..excess);

        for (i, (&sample, &w)) in self.window.iter().zip(&self.blackman).enumerate() {
            self.scratch[i] = Complex::new(sample * w, 0.0);
        }
        let fft = self.planner.plan_fft_forward(self.audio_samples);
        fft.process(&mut self.scratch);

        let new_val = self.scratch[..self.total_ffts]
            .iter()
            .map(|c| (c.im * c.im + c.re * c.re).sqrt() / 5.0)
            .fold(0.0f64, f64::max);

        // Long-term average tracks the background level so the output picks
        // out spikes above it
        let lw = self.settings.long_term_weight;
        self.long_term = self.long_term * lw + new_val * (1.0 - lw);

        let sw = self.settings.short_term_weight;
        self.val = self.val * sw + new_val * (1.0 - sw);

        let normalized = ((self.val / self.long_term - self.settings.ratio_cutoff)
            * self.settings.ratio_multiplier)
            .clamp(0.0, 1.0);
        Some(normalized)
    }
}
