//! Built-in transform catalog

mod blur;
mod brightness;
mod burst;
mod crush;
mod flash;
mod noise;
mod pixelate;
mod rainbow;
mod rotate_hue;
mod scroll;
mod solid;
mod spectrum_flow;
mod strobe;

pub use blur::{FastBlurDefinition, GaussianDefinition};
pub use brightness::BrightnessDefinition;
pub use burst::{BurstDefinition, ColorBurstDefinition};
pub use crush::CrushColorDefinition;
pub use flash::{ColorFlashDefinition, FlashDefinition};
pub use noise::NoiseDefinition;
pub use pixelate::PixelateDefinition;
pub use rainbow::RainbowDefinition;
pub use rotate_hue::RotateHueDefinition;
pub use scroll::ScrollDefinition;
pub use solid::SolidColorDefinition;
pub use spectrum_flow::SpectrumFlowDefinition;
pub use strobe::StrobeDefinition;

use super::{TransformRegistry, MIN_DURATION};

/// Register every stock transform kind
pub fn register_builtin(registry: &mut TransformRegistry) {
    registry.register(BrightnessDefinition);
    registry.register(FlashDefinition);
    registry.register(ColorFlashDefinition);
    registry.register(ScrollDefinition);
    registry.register(RotateHueDefinition);
    registry.register(GaussianDefinition);
    registry.register(FastBlurDefinition);
    registry.register(NoiseDefinition);
    registry.register(PixelateDefinition);
    registry.register(StrobeDefinition);
    registry.register(BurstDefinition);
    registry.register(ColorBurstDefinition);
    registry.register(RainbowDefinition);
    registry.register(SpectrumFlowDefinition);
    registry.register(SolidColorDefinition);
    registry.register(CrushColorDefinition);
}

/// Fraction of the current period elapsed, in [0, 1)
pub(crate) fn cycle_progress(time: f64, duration: f64) -> f64 {
    let duration = duration.max(MIN_DURATION);
    let progress = (time / duration).fract();
    if progress < 0.0 {
        progress + 1.0
    } else {
        progress
    }
}

/// Oscillation progress in [0, 1]: a sine or triangle wave of the given
/// period, starting and ending each cycle at 0
pub(crate) fn wave_progress(time: f64, duration: f64, sine: bool) -> f64 {
    let progress = cycle_progress(time, duration);
    let wave = if sine {
        -(progress * std::f64::consts::TAU).cos()
    } else {
        1.0 - 2.0 * (2.0 * progress - 1.0).abs()
    };
    (wave + 1.0) / 2.0
}
