//! Crush color transform
//!
//! Scales R/G/B by a strength factor and clamps each to a per-channel
//! ceiling. The white channel passes through untouched. Binding `strength`
//! to the audio variable gives the classic beat-crush look.

use crate::color::Color;
use crate::params::{ParamDef, ParamSet, ParamsDef};
use crate::transforms::{Transform, TransformDefinition};

pub struct CrushColorDefinition;

impl TransformDefinition for CrushColorDefinition {
    fn kind(&self) -> &'static str {
        "crushcolor"
    }

    fn display_name(&self) -> &'static str {
        "Crush color"
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![
            ParamDef::float("strength", "Scale applied before clamping", 1.0),
            ParamDef::percent("max_red", "Ceiling for the red channel", 1.0),
            ParamDef::percent("max_green", "Ceiling for the green channel", 1.0),
            ParamDef::percent("max_blue", "Ceiling for the blue channel", 1.0),
        ])
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(CrushColorTransform { params })
    }
}

struct CrushColorTransform {
    params: ParamSet,
}

impl Transform for CrushColorTransform {
    fn kind(&self) -> &'static str {
        "crushcolor"
    }

    fn transform(&mut self, _time: f64, colors: &[Color]) -> Vec<Color> {
        let strength = self.params.float("strength");
        let max_r = self.params.percent("max_red");
        let max_g = self.params.percent("max_green");
        let max_b = self.params.percent("max_blue");

        colors
            .iter()
            .map(|&c| {
                Color::rgbw(
                    (c.r * strength).min(max_r),
                    (c.g * strength).min(max_g),
                    (c.b * strength).min(max_b),
                    c.w,
                    c.a,
                )
            })
            .collect()
    }
}
