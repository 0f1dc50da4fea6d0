//! Hue rotation transform

use super::cycle_progress;
use crate::color::Color;
use crate::params::{ParamDef, ParamSet, ParamsDef};
use crate::transforms::{Transform, TransformDefinition};

pub struct RotateHueDefinition;

impl TransformDefinition for RotateHueDefinition {
    fn kind(&self) -> &'static str {
        "rotatehue"
    }

    fn display_name(&self) -> &'static str {
        "Rotate hue"
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![ParamDef::float(
            "duration",
            "Seconds per full trip around the hue circle",
            10.0,
        )])
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(RotateHueTransform { params })
    }
}

struct RotateHueTransform {
    params: ParamSet,
}

impl Transform for RotateHueTransform {
    fn kind(&self) -> &'static str {
        "rotatehue"
    }

    fn transform(&mut self, time: f64, colors: &[Color]) -> Vec<Color> {
        let progress = cycle_progress(time, self.params.float("duration"));
        colors
            .iter()
            .map(|&c| {
                let (h, s, v) = c.to_hsv();
                // Grays have no hue to rotate
                if s == 0.0 {
                    return c;
                }
                let rotated = (h + progress * 360.0).rem_euclid(360.0);
                Color::from_hsv(rotated, s, v, c.w, c.a)
            })
            .collect()
    }
}
