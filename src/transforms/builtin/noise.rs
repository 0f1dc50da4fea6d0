//! Noise transform
//!
//! Tweens every position between two random color palettes, resampling the
//! target palette each period. Per-channel strengths control how much of the
//! noise reaches each of R, G and B.

use rand::rngs::ThreadRng;
use rand::Rng;

use crate::color::{BlendMode, Color};
use crate::params::{ParamDef, ParamSet, ParamsDef};
use crate::transforms::{layer_params, Transform, TransformDefinition, MIN_DURATION};

pub struct NoiseDefinition;

impl TransformDefinition for NoiseDefinition {
    fn kind(&self) -> &'static str {
        "noise"
    }

    fn display_name(&self) -> &'static str {
        "Noise"
    }

    fn is_layer(&self) -> bool {
        true
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![
            ParamDef::float("duration", "Seconds between palette swaps", 1.0),
            ParamDef::percent("red_strength", "Noise amount on the red channel", 1.0),
            ParamDef::percent("green_strength", "Noise amount on the green channel", 1.0),
            ParamDef::percent("blue_strength", "Noise amount on the blue channel", 1.0),
        ])
        .extend(layer_params())
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(NoiseTransform {
            params,
            rng: rand::rng(),
            current: Vec::new(),
            next: Vec::new(),
            last_swap: None,
            progress: 0.0,
        })
    }
}

struct NoiseTransform {
    params: ParamSet,
    rng: ThreadRng,
    current: Vec<Color>,
    next: Vec<Color>,
    last_swap: Option<f64>,
    progress: f64,
}

impl NoiseTransform {
    fn random_palette(&mut self, n: usize) -> Vec<Color> {
        (0..n)
            .map(|_| {
                Color::new(
                    self.rng.random::<f64>(),
                    self.rng.random::<f64>(),
                    self.rng.random::<f64>(),
                )
            })
            .collect()
    }
}

impl Transform for NoiseTransform {
    fn kind(&self) -> &'static str {
        "noise"
    }

    fn tick_frame(&mut self, time: f64, num_positions: usize) {
        if self.last_swap.is_none()
            || self.current.len() != num_positions
            || self.next.len() != num_positions
        {
            self.current = self.random_palette(num_positions);
            self.next = self.random_palette(num_positions);
            self.last_swap = Some(time);
        }

        let duration = self.params.float("duration").max(MIN_DURATION);
        let last_swap = self.last_swap.unwrap_or(time);
        if time - last_swap > duration {
            self.last_swap = Some(time);
            self.current = std::mem::take(&mut self.next);
            self.next = self.random_palette(num_positions);
        }

        let last_swap = self.last_swap.unwrap_or(time);
        self.progress = ((time - last_swap) / duration).clamp(0.0, 1.0);
    }

    fn transform(&mut self, _time: f64, colors: &[Color]) -> Vec<Color> {
        let rs = self.params.percent("red_strength");
        let gs = self.params.percent("green_strength");
        let bs = self.params.percent("blue_strength");
        let opacity = self.params.percent("opacity");
        let mode = BlendMode::parse(&self.params.string("blend_mode"));

        colors
            .iter()
            .enumerate()
            .map(|(i, &bg)| {
                let tween = Color::lerp(self.current[i], self.next[i], self.progress);
                let mut fg = Color::new(
                    bg.r * (1.0 - rs) + tween.r * rs,
                    bg.g * (1.0 - gs) + tween.g * gs,
                    bg.b * (1.0 - bs) + tween.b * bs,
                );
                fg.a *= opacity;
                mode.blend(bg, fg)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noise(payload: serde_json::Value) -> Box<dyn Transform> {
        let definition = NoiseDefinition;
        let params = ParamSet::from_json(definition.params_def(), &payload);
        definition.create(params)
    }

    #[test]
    fn test_zero_strength_passes_base_through() {
        let mut t = noise(json!({
            "red_strength": 0.0,
            "green_strength": 0.0,
            "blue_strength": 0.0
        }));
        let base = vec![Color::new(0.3, 0.6, 0.9); 4];
        t.tick_frame(0.0, 4);
        let out = t.transform(0.0, &base);
        for c in out {
            assert!((c.r - 0.3).abs() < 1e-9);
            assert!((c.g - 0.6).abs() < 1e-9);
            assert!((c.b - 0.9).abs() < 1e-9);
        }
    }

    #[test]
    fn test_output_length_matches_input() {
        let mut t = noise(json!({}));
        t.tick_frame(0.0, 7);
        assert_eq!(t.transform(0.0, &vec![Color::BLACK; 7]).len(), 7);
    }

    #[test]
    fn test_palette_swap_after_duration() {
        let mut t = noise(json!({ "duration": 1.0 }));
        t.tick_frame(0.0, 4);
        t.transform(0.0, &vec![Color::BLACK; 4]);

        // Just past the period the old target becomes current
        t.tick_frame(1.5, 4);
        let out_after_swap = t.transform(1.5, &vec![Color::BLACK; 4]);
        assert_eq!(out_after_swap.len(), 4);
    }

    #[test]
    fn test_progress_stays_in_unit_range() {
        let mut t = noise(json!({ "duration": 0.5 }));
        for i in 0..20 {
            t.tick_frame(i as f64 * 0.13, 3);
            let out = t.transform(i as f64 * 0.13, &vec![Color::BLACK; 3]);
            for c in out {
                assert!(c.r >= 0.0 && c.r <= 1.0);
            }
        }
    }

    #[test]
    fn test_noise_is_animated() {
        let t = noise(json!({}));
        assert!(t.is_animated());
    }
}
