//! Flash transforms
//!
//! `flash` oscillates the whole strip's brightness between two values along
//! a sine or triangle wave; `colorflash` oscillates between two colors and
//! blends the result in as a layer.

use super::wave_progress;
use crate::color::Color;
use crate::params::{ParamDef, ParamSet, ParamsDef};
use crate::transforms::{apply_layer, layer_params, Transform, TransformDefinition};

pub struct FlashDefinition;

impl TransformDefinition for FlashDefinition {
    fn kind(&self) -> &'static str {
        "flash"
    }

    fn display_name(&self) -> &'static str {
        "Flash"
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![
            ParamDef::float("start_value", "Brightness at the cycle ends", 0.0),
            ParamDef::float("end_value", "Brightness at the cycle peak", 1.0),
            ParamDef::float("duration", "Seconds per full oscillation", 1.0),
            ParamDef::boolean("sine", "Smooth sine instead of triangle", true),
        ])
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(FlashTransform { params })
    }
}

struct FlashTransform {
    params: ParamSet,
}

impl Transform for FlashTransform {
    fn kind(&self) -> &'static str {
        "flash"
    }

    fn transform(&mut self, time: f64, colors: &[Color]) -> Vec<Color> {
        let progress = wave_progress(
            time,
            self.params.float("duration"),
            self.params.boolean("sine"),
        );
        let scale = (1.0 - progress) * self.params.float("start_value")
            + progress * self.params.float("end_value");
        colors.iter().map(|&c| c * scale).collect()
    }
}

pub struct ColorFlashDefinition;

impl TransformDefinition for ColorFlashDefinition {
    fn kind(&self) -> &'static str {
        "colorflash"
    }

    fn display_name(&self) -> &'static str {
        "Color flash"
    }

    fn is_layer(&self) -> bool {
        true
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![
            ParamDef::color("start_color", "Color at the cycle ends", Color::BLACK),
            ParamDef::color("end_color", "Color at the cycle peak", Color::WHITE),
            ParamDef::float("duration", "Seconds per full oscillation", 1.0),
            ParamDef::boolean("sine", "Smooth sine instead of triangle", true),
        ])
        .extend(layer_params())
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(ColorFlashTransform { params })
    }
}

struct ColorFlashTransform {
    params: ParamSet,
}

impl Transform for ColorFlashTransform {
    fn kind(&self) -> &'static str {
        "colorflash"
    }

    fn transform(&mut self, time: f64, colors: &[Color]) -> Vec<Color> {
        let progress = wave_progress(
            time,
            self.params.float("duration"),
            self.params.boolean("sine"),
        );
        let current = Color::lerp(
            self.params.color("start_color"),
            self.params.color("end_color"),
            progress,
        );
        apply_layer(&self.params, colors, |_| current)
    }
}
