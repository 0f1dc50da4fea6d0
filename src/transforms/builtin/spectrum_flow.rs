//! Spectrum flow layer
//!
//! Samples a 3-stop gradient with the `value` parameter each tick and lets
//! the sampled colors flow down the strip: position i shows the color that
//! was current `i * duration / N` seconds ago, interpolating between
//! adjacent samples. `value` is usually driven by a variable binding, e.g.
//! the audio beat.

use std::collections::VecDeque;

use crate::color::Color;
use crate::params::{ParamDef, ParamSet, ParamsDef};
use crate::transforms::{apply_layer, layer_params, Transform, TransformDefinition, MIN_DURATION};

pub struct SpectrumFlowDefinition;

impl TransformDefinition for SpectrumFlowDefinition {
    fn kind(&self) -> &'static str {
        "spectrumflow"
    }

    fn display_name(&self) -> &'static str {
        "Spectrum flow"
    }

    fn is_layer(&self) -> bool {
        true
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![
            ParamDef::percent("value", "Gradient position sampled each frame", 0.0),
            ParamDef::float("duration", "Seconds for a sample to travel the strip", 2.0),
            ParamDef::color("start_color", "Gradient at value 0", Color::BLACK),
            ParamDef::color("mid_color", "Gradient at value 0.5", Color::new(1.0, 0.0, 0.0)),
            ParamDef::color("end_color", "Gradient at value 1", Color::WHITE),
        ])
        .extend(layer_params())
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(SpectrumFlowTransform {
            params,
            samples: VecDeque::new(),
        })
    }
}

struct SpectrumFlowTransform {
    params: ParamSet,
    /// Time-stamped gradient samples, oldest first
    samples: VecDeque<(f64, Color)>,
}

impl SpectrumFlowTransform {
    fn gradient(&self, value: f64) -> Color {
        let value = value.clamp(0.0, 1.0);
        let start = self.params.color("start_color");
        let mid = self.params.color("mid_color");
        let end = self.params.color("end_color");
        if value <= 0.5 {
            Color::lerp(start, mid, value * 2.0)
        } else {
            Color::lerp(mid, end, (value - 0.5) * 2.0)
        }
    }

    /// Color that was current at `target`, linearly interpolated between the
    /// two samples bracketing it
    fn sample_at(&self, target: f64) -> Color {
        let Some(&(first_time, first_color)) = self.samples.front() else {
            return Color::BLACK;
        };
        if target <= first_time {
            return first_color;
        }
        let split = self.samples.partition_point(|&(t, _)| t <= target);
        if split >= self.samples.len() {
            return self.samples.back().map(|&(_, c)| c).unwrap_or(first_color);
        }
        let (t0, c0) = self.samples[split - 1];
        let (t1, c1) = self.samples[split];
        let span = t1 - t0;
        if span <= 0.0 {
            return c1;
        }
        Color::lerp(c0, c1, (target - t0) / span)
    }
}

impl Transform for SpectrumFlowTransform {
    fn kind(&self) -> &'static str {
        "spectrumflow"
    }

    fn tick_frame(&mut self, time: f64, _num_positions: usize) {
        let color = self.gradient(self.params.percent("value"));
        self.samples.push_back((time, color));

        let duration = self.params.float("duration").max(MIN_DURATION);
        while let Some(&(t, _)) = self.samples.front() {
            if time - t > duration && self.samples.len() > 1 {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    fn transform(&mut self, time: f64, colors: &[Color]) -> Vec<Color> {
        let n = colors.len().max(1) as f64;
        let duration = self.params.float("duration").max(MIN_DURATION);
        let this = &*self;
        apply_layer(&this.params, colors, |i| {
            this.sample_at(time - i as f64 * duration / n)
        })
    }
}
