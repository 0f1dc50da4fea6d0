//! Burst transforms
//!
//! Sparks spawn with Poisson-like probability, drift at a fixed velocity,
//! and fade in then out over their lifetime. `burst` modulates the incoming
//! frame's brightness; `colorburst` paints sparks in a configured color as
//! a layer.

use rand::rngs::ThreadRng;
use rand::Rng;

use crate::color::Color;
use crate::params::{ParamDef, ParamSet, ParamsDef};
use crate::transforms::{apply_layer, layer_params, Transform, TransformDefinition, MIN_DURATION};

/// A transient point source on the strip
struct Spark {
    position: f64,
    /// Normalized lifetime, 0 at spawn, reaped at 1
    age: f64,
    duration: f64,
    velocity: f64,
    radius: f64,
}

/// Shared spark bookkeeping for both burst variants
struct SparkField {
    sparks: Vec<Spark>,
    brightness: Vec<f64>,
    last_time: Option<f64>,
    rng: ThreadRng,
}

impl SparkField {
    fn new() -> Self {
        Self {
            sparks: Vec::new(),
            brightness: Vec::new(),
            last_time: None,
            rng: rand::rng(),
        }
    }

    fn tick(&mut self, time: f64, num_positions: usize, params: &ParamSet) {
        let last = *self.last_time.get_or_insert(time);
        let dt = time - last;
        self.last_time = Some(time);

        let duration = params.float("duration").max(MIN_DURATION);
        let radius = params.float("radius").max(MIN_DURATION);
        let velocity = params.float("velocity");
        let rate = params.float("rate");

        // Advance and reap
        for spark in &mut self.sparks {
            spark.age += dt / spark.duration;
            spark.position += spark.velocity * dt;
        }
        self.sparks.retain(|s| s.age < 1.0);

        // Spawn; per-position chance keeps the expected total at dt * rate
        let chance = dt * rate / num_positions as f64;
        for i in 0..num_positions {
            if self.rng.random::<f64>() < chance {
                self.sparks.push(Spark {
                    position: i as f64,
                    age: 0.0,
                    duration,
                    velocity,
                    radius,
                });
            }
        }

        // Accumulate brightness contributions
        self.brightness.clear();
        self.brightness.resize(num_positions, 0.0);
        for spark in &self.sparks {
            let min_index = ((spark.position - spark.radius).ceil().max(0.0)) as usize;
            let max_index = (spark.position + spark.radius).floor() as i64;
            let max_index = max_index.min(num_positions as i64 - 1);
            if max_index < 0 {
                continue;
            }
            for i in min_index..=max_index as usize {
                let distance = (spark.position - i as f64).abs();
                let contribution =
                    (1.0 - distance / spark.radius) - (2.0 * spark.age - 1.0).abs();
                if contribution > 0.0 {
                    self.brightness[i] += contribution;
                }
            }
        }
    }

    fn spark_count(&self) -> usize {
        self.sparks.len()
    }
}

fn spark_params() -> Vec<ParamDef> {
    vec![
        ParamDef::float("rate", "Expected sparks per second across the strip", 2.0),
        ParamDef::float("duration", "Seconds each spark lives", 1.0),
        ParamDef::float("radius", "Positions lit around each spark", 3.0),
        ParamDef::float("velocity", "Positions per second of spark drift", 0.0),
    ]
}

pub struct BurstDefinition;

impl TransformDefinition for BurstDefinition {
    fn kind(&self) -> &'static str {
        "burst"
    }

    fn display_name(&self) -> &'static str {
        "Burst"
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(spark_params())
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(BurstTransform {
            params,
            field: SparkField::new(),
        })
    }
}

struct BurstTransform {
    params: ParamSet,
    field: SparkField,
}

impl Transform for BurstTransform {
    fn kind(&self) -> &'static str {
        "burst"
    }

    fn tick_frame(&mut self, time: f64, num_positions: usize) {
        self.field.tick(time, num_positions, &self.params);
    }

    fn transform(&mut self, _time: f64, colors: &[Color]) -> Vec<Color> {
        colors
            .iter()
            .enumerate()
            .map(|(i, &c)| c * self.field.brightness.get(i).copied().unwrap_or(0.0))
            .collect()
    }
}

pub struct ColorBurstDefinition;

impl TransformDefinition for ColorBurstDefinition {
    fn kind(&self) -> &'static str {
        "colorburst"
    }

    fn display_name(&self) -> &'static str {
        "Color burst"
    }

    fn is_layer(&self) -> bool {
        true
    }

    fn params_def(&self) -> ParamsDef {
        let mut defs = spark_params();
        defs.push(ParamDef::color(
            "color",
            "Color the sparks light up in",
            Color::WHITE,
        ));
        ParamsDef::new(defs).extend(layer_params())
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(ColorBurstTransform {
            params,
            field: SparkField::new(),
        })
    }
}

struct ColorBurstTransform {
    params: ParamSet,
    field: SparkField,
}

impl Transform for ColorBurstTransform {
    fn kind(&self) -> &'static str {
        "colorburst"
    }

    fn tick_frame(&mut self, time: f64, num_positions: usize) {
        self.field.tick(time, num_positions, &self.params);
    }

    fn transform(&mut self, _time: f64, colors: &[Color]) -> Vec<Color> {
        let color = self.params.color("color");
        let brightness = &self.field.brightness;
        apply_layer(&self.params, colors, |i| {
            let mut fg = color;
            fg.a *= brightness.get(i).copied().unwrap_or(0.0).min(1.0);
            fg
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_params(rate: f64) -> ParamSet {
        ParamSet::from_json(
            ParamsDef::new(spark_params()),
            &json!({ "rate": rate, "duration": 1.0, "radius": 2.0 }),
        )
    }

    #[test]
    fn test_spark_population_tracks_poisson_mean() {
        let params = field_params(50.0);
        let mut field = SparkField::new();

        // Run 10 simulated seconds at 100 fps; in steady state the live
        // population sits near rate * duration = 50
        for frame in 0..1000 {
            field.tick(frame as f64 * 0.01, 64, &params);
        }
        let live = field.spark_count() as f64;
        assert!(live > 20.0 && live < 90.0, "live sparks {live}");
    }

    #[test]
    fn test_sparks_age_and_die() {
        let params = field_params(1000.0);
        let mut field = SparkField::new();
        field.tick(0.0, 16, &params);
        field.tick(0.1, 16, &params);
        assert!(field.spark_count() > 0);

        // After two lifetimes with zero rate nothing survives
        let quiet = ParamSet::from_json(
            ParamsDef::new(spark_params()),
            &json!({ "rate": 0.0, "duration": 1.0, "radius": 2.0 }),
        );
        field.tick(2.5, 16, &quiet);
        assert_eq!(field.spark_count(), 0);
    }

    #[test]
    fn test_first_tick_spawns_nothing() {
        let params = field_params(1e9);
        let mut field = SparkField::new();
        // dt is zero on the first tick, so chance is zero
        field.tick(5.0, 8, &params);
        assert_eq!(field.spark_count(), 0);
    }

    #[test]
    fn test_brightness_clipped_at_zero() {
        let params = field_params(100.0);
        let mut field = SparkField::new();
        for frame in 0..50 {
            field.tick(frame as f64 * 0.02, 32, &params);
            assert!(field.brightness.iter().all(|&b| b >= 0.0));
        }
    }

    #[test]
    fn test_burst_scales_base() {
        let definition = BurstDefinition;
        let params = ParamSet::from_json(definition.params_def(), &json!({ "rate": 0.0 }));
        let mut t = definition.create(params);
        t.tick_frame(0.0, 4);
        t.tick_frame(0.5, 4);
        // No sparks: everything dark
        let out = t.transform(0.5, &vec![Color::WHITE; 4]);
        assert!(out.iter().all(|c| c.r == 0.0));
    }

    #[test]
    fn test_colorburst_length_invariant() {
        let definition = ColorBurstDefinition;
        let params = ParamSet::from_json(definition.params_def(), &json!({ "rate": 20.0 }));
        let mut t = definition.create(params);
        for frame in 0..10 {
            t.tick_frame(frame as f64 * 0.05, 12);
            assert_eq!(t.transform(frame as f64 * 0.05, &vec![Color::BLACK; 12]).len(), 12);
        }
    }
}
