//! Rainbow layer
//!
//! Distributes the hue circle evenly across the strip at a configurable
//! saturation.

use crate::color::Color;
use crate::params::{ParamDef, ParamSet, ParamsDef};
use crate::transforms::{apply_layer, layer_params, Transform, TransformDefinition};

pub struct RainbowDefinition;

impl TransformDefinition for RainbowDefinition {
    fn kind(&self) -> &'static str {
        "rainbow"
    }

    fn display_name(&self) -> &'static str {
        "Rainbow"
    }

    fn is_layer(&self) -> bool {
        true
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![ParamDef::percent(
            "saturation",
            "Color saturation across the strip",
            1.0,
        )])
        .extend(layer_params())
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(RainbowTransform { params })
    }
}

struct RainbowTransform {
    params: ParamSet,
}

impl Transform for RainbowTransform {
    fn kind(&self) -> &'static str {
        "rainbow"
    }

    fn transform(&mut self, _time: f64, colors: &[Color]) -> Vec<Color> {
        let n = colors.len().max(1) as f64;
        let saturation = self.params.percent("saturation").clamp(0.0, 1.0);
        apply_layer(&self.params, colors, |i| {
            Color::from_hsv(i as f64 * 360.0 / n, saturation, 1.0, 0.0, 1.0)
        })
    }

    fn is_animated(&self) -> bool {
        self.params.has_bindings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_even_hue_distribution() {
        let definition = RainbowDefinition;
        let params = ParamSet::from_json(definition.params_def(), &json!({}));
        let mut t = definition.create(params);

        let out = t.transform(0.0, &vec![Color::BLACK; 6]);
        let hues: Vec<f64> = out.iter().map(|c| c.to_hsv().0).collect();
        for (i, &h) in hues.iter().enumerate() {
            assert!((h - i as f64 * 60.0).abs() < 1e-6, "position {i}: hue {h}");
        }
    }

    #[test]
    fn test_zero_saturation_is_white() {
        let definition = RainbowDefinition;
        let params = ParamSet::from_json(
            definition.params_def(),
            &json!({ "saturation": 0.0 }),
        );
        let mut t = definition.create(params);
        let out = t.transform(0.0, &vec![Color::BLACK; 3]);
        for c in out {
            assert_eq!(c, Color::WHITE);
        }
    }

    #[test]
    fn test_static_without_bindings() {
        let definition = RainbowDefinition;
        let params = ParamSet::from_json(definition.params_def(), &json!({}));
        assert!(!definition.create(params).is_animated());
    }
}
