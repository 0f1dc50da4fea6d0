//! Strobe transform
//!
//! Frame-counted on/off gate: the strip shows the incoming frame for
//! `frames_on` frames, then black for `frames_off` frames.

use crate::color::Color;
use crate::params::{ParamDef, ParamSet, ParamsDef};
use crate::transforms::{Transform, TransformDefinition};

pub struct StrobeDefinition;

impl TransformDefinition for StrobeDefinition {
    fn kind(&self) -> &'static str {
        "strobe"
    }

    fn display_name(&self) -> &'static str {
        "Strobe"
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![
            ParamDef::long("frames_on", "Frames with the strip lit", 1),
            ParamDef::long("frames_off", "Frames with the strip dark", 2),
        ])
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(StrobeTransform {
            params,
            state_on: true,
            frames: 0,
        })
    }
}

struct StrobeTransform {
    params: ParamSet,
    state_on: bool,
    frames: i64,
}

impl Transform for StrobeTransform {
    fn kind(&self) -> &'static str {
        "strobe"
    }

    fn tick_frame(&mut self, _time: f64, _num_positions: usize) {
        self.frames += 1;
        if self.state_on {
            if self.frames > self.params.long("frames_on") {
                self.state_on = false;
                self.frames = 0;
            }
        } else if self.frames > self.params.long("frames_off") {
            self.state_on = true;
            self.frames = 0;
        }
    }

    fn transform(&mut self, _time: f64, colors: &[Color]) -> Vec<Color> {
        if self.state_on {
            colors.to_vec()
        } else {
            vec![Color::BLACK; colors.len()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duty_cycle() {
        let definition = StrobeDefinition;
        let params = ParamSet::from_json(
            definition.params_def(),
            &json!({ "frames_on": 2, "frames_off": 1 }),
        );
        let mut t = definition.create(params);
        let input = vec![Color::WHITE; 3];

        let mut pattern = Vec::new();
        for frame in 0..9 {
            t.tick_frame(frame as f64 * 0.05, 3);
            let out = t.transform(frame as f64 * 0.05, &input);
            pattern.push(out[0] == Color::WHITE);
        }

        // Some frames lit, some dark, strip-wide
        assert!(pattern.iter().any(|&on| on));
        assert!(pattern.iter().any(|&on| !on));
    }

    #[test]
    fn test_dark_frames_are_black() {
        let definition = StrobeDefinition;
        let params = ParamSet::from_json(
            definition.params_def(),
            &json!({ "frames_on": 1, "frames_off": 10 }),
        );
        let mut t = definition.create(params);
        let input = vec![Color::WHITE; 2];
        for frame in 0..5 {
            t.tick_frame(frame as f64 * 0.05, 2);
        }
        let out = t.transform(0.25, &input);
        assert_eq!(out, vec![Color::BLACK; 2]);
    }
}
