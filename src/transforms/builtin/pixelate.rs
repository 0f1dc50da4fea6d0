//! Pixelate transform
//!
//! Averages contiguous blocks of positions and replicates the average across
//! each block. A trailing partial block averages whatever it covers.

use crate::color::Color;
use crate::params::{ParamDef, ParamSet, ParamsDef};
use crate::transforms::{Transform, TransformDefinition};

pub struct PixelateDefinition;

impl TransformDefinition for PixelateDefinition {
    fn kind(&self) -> &'static str {
        "pixelate"
    }

    fn display_name(&self) -> &'static str {
        "Pixelate"
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![ParamDef::long(
            "block_size",
            "Positions averaged into one block",
            4,
        )])
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(PixelateTransform { params })
    }
}

struct PixelateTransform {
    params: ParamSet,
}

impl Transform for PixelateTransform {
    fn kind(&self) -> &'static str {
        "pixelate"
    }

    fn transform(&mut self, _time: f64, colors: &[Color]) -> Vec<Color> {
        let block_size = self.params.long("block_size").max(1) as usize;
        if block_size <= 1 {
            return colors.to_vec();
        }

        let mut out = Vec::with_capacity(colors.len());
        for block in colors.chunks(block_size) {
            let mut acc = Color::BLACK;
            for &c in block {
                acc = acc + c;
            }
            let average = acc / block.len() as f64;
            out.extend(std::iter::repeat(average).take(block.len()));
        }
        out
    }

    fn is_animated(&self) -> bool {
        self.params.has_bindings()
    }
}
