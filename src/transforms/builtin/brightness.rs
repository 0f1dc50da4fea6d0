//! Uniform brightness transform

use crate::color::Color;
use crate::params::{ParamDef, ParamSet, ParamsDef};
use crate::transforms::{Transform, TransformDefinition};

pub struct BrightnessDefinition;

impl TransformDefinition for BrightnessDefinition {
    fn kind(&self) -> &'static str {
        "brightness"
    }

    fn display_name(&self) -> &'static str {
        "Brightness"
    }

    fn description(&self) -> &'static str {
        "Multiplies every color by a fixed factor"
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![ParamDef::float(
            "brightness",
            "Multiplier applied to every color",
            1.0,
        )])
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(BrightnessTransform { params })
    }
}

struct BrightnessTransform {
    params: ParamSet,
}

impl Transform for BrightnessTransform {
    fn kind(&self) -> &'static str {
        "brightness"
    }

    fn transform(&mut self, _time: f64, colors: &[Color]) -> Vec<Color> {
        let brightness = self.params.float("brightness");
        colors.iter().map(|&c| c * brightness).collect()
    }

    fn is_animated(&self) -> bool {
        // Static unless a variable drives the factor
        self.params.has_bindings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(payload: serde_json::Value) -> Box<dyn Transform> {
        let definition = BrightnessDefinition;
        let params = ParamSet::from_json(definition.params_def(), &payload);
        definition.create(params)
    }

    #[test]
    fn test_halves_every_channel() {
        let mut t = build(json!({ "brightness": 0.5 }));
        let out = t.transform(0.0, &[Color::WHITE, Color::new(0.5, 0.0, 1.0)]);
        assert_eq!(out[0], Color::rgbw(0.5, 0.5, 0.5, 0.0, 1.0));
        assert_eq!(out[1], Color::rgbw(0.25, 0.0, 0.5, 0.0, 1.0));
    }

    #[test]
    fn test_static_without_bindings() {
        let t = build(json!({}));
        assert!(!t.is_animated());
    }

    #[test]
    fn test_preserves_alpha() {
        let mut t = build(json!({ "brightness": 2.0 }));
        let out = t.transform(0.0, &[Color::with_alpha(0.5, 0.5, 0.5, 0.25)]);
        assert_eq!(out[0].a, 0.25);
        assert_eq!(out[0].r, 1.0);
    }
}
