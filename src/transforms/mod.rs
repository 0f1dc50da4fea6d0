//! Transform runtime
//!
//! Transforms are per-frame color operators evaluated in pipeline order.
//! A transform is either *direct* (maps the incoming frame to a new frame)
//! or a *layer* (synthesizes a color per position and blends it over the
//! incoming frame through the shared opacity/blend-mode parameters).
//!
//! The module splits data from dispatch the same way throughout:
//!
//! - `TransformDefinition` is the factory for one kind: parameter schema,
//!   layer flag, runtime construction
//! - `Transform` is the per-run instance ticked and applied each frame
//! - `TransformRegistry` maps kind names to definitions
//! - `builtin/` holds the stock catalog

mod registry;

pub mod builtin;

pub use registry::TransformRegistry;

use crate::color::{BlendMode, Color};
use crate::params::{ParamDef, ParamSet, ParamsDef};

/// Smallest allowed period; shorter configured durations clamp to this
pub const MIN_DURATION: f64 = 1e-6;

/// A live transform instance
pub trait Transform {
    fn kind(&self) -> &'static str;

    /// Called once per frame before `transform`, in pipeline order
    fn tick_frame(&mut self, _time: f64, _num_positions: usize) {}

    /// Produce the next frame. Implementations must return a buffer of the
    /// same length and must not hold on to `colors`.
    fn transform(&mut self, time: f64, colors: &[Color]) -> Vec<Color>;

    /// False only when the output depends solely on the input frame and
    /// static parameters; lets the driver drop to 1 Hz
    fn is_animated(&self) -> bool {
        true
    }
}

/// Factory for one transform kind
pub trait TransformDefinition {
    /// Kind identifier used in persisted pipelines (e.g. "scroll")
    fn kind(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        ""
    }

    /// Layer transforms carry the shared opacity/blend-mode parameters
    fn is_layer(&self) -> bool {
        false
    }

    fn params_def(&self) -> ParamsDef;

    /// Build a runtime instance over an already-parsed parameter set
    fn create(&self, params: ParamSet) -> Box<dyn Transform>;
}

/// The shared parameters every layer transform carries
pub fn layer_params() -> Vec<ParamDef> {
    vec![
        ParamDef::percent("opacity", "Layer opacity", 1.0),
        ParamDef::string("blend_mode", "normal, multiply or alpha", "normal"),
    ]
}

/// Blend a synthesized per-position color sequence over the incoming frame
pub fn apply_layer<F>(params: &ParamSet, colors: &[Color], mut synth: F) -> Vec<Color>
where
    F: FnMut(usize) -> Color,
{
    let opacity = params.percent("opacity");
    let mode = BlendMode::parse(&params.string("blend_mode"));
    colors
        .iter()
        .enumerate()
        .map(|(i, &bg)| {
            let mut fg = synth(i);
            fg.a *= opacity;
            mode.blend(bg, fg)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layer_set(payload: serde_json::Value) -> ParamSet {
        ParamSet::from_json(ParamsDef::new(layer_params()), &payload)
    }

    #[test]
    fn test_apply_layer_full_opacity_normal() {
        let params = layer_set(json!({}));
        let base = vec![Color::BLACK; 3];
        let out = apply_layer(&params, &base, |_| Color::new(1.0, 0.0, 0.0));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Color::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_apply_layer_half_opacity() {
        let params = layer_set(json!({ "opacity": 0.5 }));
        let base = vec![Color::BLACK; 1];
        let out = apply_layer(&params, &base, |_| Color::new(1.0, 1.0, 1.0));
        assert!((out[0].r - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_apply_layer_multiply() {
        let params = layer_set(json!({ "blend_mode": "multiply" }));
        let base = vec![Color::new(0.5, 1.0, 0.25)];
        let out = apply_layer(&params, &base, |_| Color::new(0.5, 0.5, 1.0));
        assert!((out[0].r - 0.25).abs() < 1e-9);
        assert!((out[0].g - 0.5).abs() < 1e-9);
        assert!((out[0].b - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_apply_layer_unknown_mode_is_normal() {
        let params = layer_set(json!({ "blend_mode": "overlay" }));
        let base = vec![Color::BLACK];
        let out = apply_layer(&params, &base, |_| Color::new(0.0, 1.0, 0.0));
        assert_eq!(out[0], Color::new(0.0, 1.0, 0.0));
    }
}
