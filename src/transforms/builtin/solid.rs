//! Solid color layer

use crate::color::Color;
use crate::params::{ParamDef, ParamSet, ParamsDef};
use crate::transforms::{apply_layer, layer_params, Transform, TransformDefinition};

pub struct SolidColorDefinition;

impl TransformDefinition for SolidColorDefinition {
    fn kind(&self) -> &'static str {
        "color"
    }

    fn display_name(&self) -> &'static str {
        "Solid color"
    }

    fn is_layer(&self) -> bool {
        true
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![ParamDef::color(
            "color",
            "Color painted across the strip",
            Color::WHITE,
        )])
        .extend(layer_params())
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(SolidColorTransform { params })
    }
}

struct SolidColorTransform {
    params: ParamSet,
}

impl Transform for SolidColorTransform {
    fn kind(&self) -> &'static str {
        "color"
    }

    fn transform(&mut self, _time: f64, colors: &[Color]) -> Vec<Color> {
        let color = self.params.color("color");
        apply_layer(&self.params, colors, |_| color)
    }

    fn is_animated(&self) -> bool {
        self.params.has_bindings()
    }
}
