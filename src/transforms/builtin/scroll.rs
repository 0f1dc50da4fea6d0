//! Scroll transform
//!
//! Maintains a floating offset advanced every tick; each output position
//! sources from the offset position in the incoming frame, wrapping at the
//! strip ends. With blending enabled, fractional offsets interpolate between
//! adjacent source positions.

use crate::color::Color;
use crate::params::{ParamDef, ParamSet, ParamsDef};
use crate::transforms::{Transform, TransformDefinition, MIN_DURATION};

pub struct ScrollDefinition;

impl TransformDefinition for ScrollDefinition {
    fn kind(&self) -> &'static str {
        "scroll"
    }

    fn display_name(&self) -> &'static str {
        "Scroll"
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![
            ParamDef::float("duration", "Seconds per full loop of the strip", 5.0),
            ParamDef::boolean("blend", "Interpolate between adjacent positions", true),
            ParamDef::boolean("reverse", "Scroll the other way", false),
        ])
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(ScrollTransform {
            params,
            offset: 0.0,
            last_time: None,
        })
    }
}

struct ScrollTransform {
    params: ParamSet,
    offset: f64,
    last_time: Option<f64>,
}

impl Transform for ScrollTransform {
    fn kind(&self) -> &'static str {
        "scroll"
    }

    fn tick_frame(&mut self, time: f64, num_positions: usize) {
        let last = *self.last_time.get_or_insert(time);
        let dt = time - last;
        self.last_time = Some(time);

        let duration = self.params.float("duration").max(MIN_DURATION);
        let delta = dt * num_positions as f64 / duration;
        if self.params.boolean("reverse") {
            self.offset -= delta;
        } else {
            self.offset += delta;
        }
        self.offset = self.offset.rem_euclid(num_positions as f64);
    }

    fn transform(&mut self, _time: f64, colors: &[Color]) -> Vec<Color> {
        let n = colors.len();
        if n == 0 {
            return Vec::new();
        }
        let base = self.offset.floor() as usize % n;
        let percent = self.offset.fract();
        let blend = self.params.boolean("blend");

        (0..n)
            .map(|i| {
                let source = (base + i) % n;
                if percent == 0.0 || !blend {
                    colors[source]
                } else {
                    let next = (source + 1) % n;
                    colors[source] * (1.0 - percent) + colors[next] * percent
                }
            })
            .collect()
    }
}
