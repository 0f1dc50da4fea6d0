//! Blur transforms
//!
//! `gaussian` is a direct 1-D Gaussian convolution on the circular strip.
//! `fastblur` approximates it with repeated box filters sized by the
//! standard boxes-for-Gaussian decomposition, using a running sum so each
//! pass is O(n) regardless of radius.

use crate::color::Color;
use crate::params::{ParamDef, ParamSet, ParamsDef};
use crate::transforms::{Transform, TransformDefinition};

pub struct GaussianDefinition;

impl TransformDefinition for GaussianDefinition {
    fn kind(&self) -> &'static str {
        "gaussian"
    }

    fn display_name(&self) -> &'static str {
        "Gaussian blur"
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![ParamDef::float(
            "standarddev",
            "Blur strength (standard deviation in positions)",
            2.0,
        )])
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(GaussianTransform {
            params,
            kernel: Vec::new(),
            kernel_sigma: f64::NAN,
        })
    }
}

struct GaussianTransform {
    params: ParamSet,
    kernel: Vec<f64>,
    kernel_sigma: f64,
}

impl GaussianTransform {
    /// Rebuild the normalized kernel when sigma changes
    fn refresh_kernel(&mut self, sigma: f64) {
        if sigma == self.kernel_sigma {
            return;
        }
        self.kernel_sigma = sigma;
        let radius = (sigma * 3.0) as i64;
        let gauss = |x: f64| {
            (-x * x / (2.0 * sigma * sigma)).exp()
                / ((2.0 * std::f64::consts::PI).sqrt() * sigma)
        };
        let mut kernel: Vec<f64> = (-radius..=radius).map(|i| gauss(i as f64)).collect();
        // The tails are cut off, so renormalize to preserve total energy
        let total: f64 = kernel.iter().sum();
        for weight in &mut kernel {
            *weight /= total;
        }
        self.kernel = kernel;
    }
}

impl Transform for GaussianTransform {
    fn kind(&self) -> &'static str {
        "gaussian"
    }

    fn transform(&mut self, _time: f64, colors: &[Color]) -> Vec<Color> {
        let sigma = self.params.float("standarddev");
        if sigma <= 0.0 {
            return colors.to_vec();
        }
        self.refresh_kernel(sigma);

        let n = colors.len();
        if n == 0 {
            return Vec::new();
        }
        let radius = (self.kernel.len() / 2) as i64;

        (0..n as i64)
            .map(|position| {
                let mut acc = Color::BLACK;
                for (k, &weight) in self.kernel.iter().enumerate() {
                    let source = (position + k as i64 - radius).rem_euclid(n as i64) as usize;
                    acc = acc + colors[source] * weight;
                }
                acc
            })
            .collect()
    }

    fn is_animated(&self) -> bool {
        self.params.has_bindings()
    }
}

pub struct FastBlurDefinition;

impl TransformDefinition for FastBlurDefinition {
    fn kind(&self) -> &'static str {
        "fastblur"
    }

    fn display_name(&self) -> &'static str {
        "Fast blur"
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![
            ParamDef::float(
                "standarddev",
                "Blur strength (standard deviation in positions)",
                2.0,
            ),
            ParamDef::long("passes", "Number of box filter passes", 3),
        ])
    }

    fn create(&self, params: ParamSet) -> Box<dyn Transform> {
        Box::new(FastBlurTransform { params })
    }
}

struct FastBlurTransform {
    params: ParamSet,
}

/// Box filter sizes whose repeated application approximates a Gaussian of
/// the given sigma (Wells' decomposition)
fn box_sizes(sigma: f64, passes: usize) -> Vec<usize> {
    let n = passes as f64;
    let w_ideal = ((12.0 * sigma * sigma / n) + 1.0).sqrt();
    let mut wl = w_ideal.floor() as i64;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wl = wl.max(1);
    let wu = wl + 2;

    let m_ideal = (12.0 * sigma * sigma - n * (wl * wl) as f64 - 4.0 * n * wl as f64 - 3.0 * n)
        / (-4.0 * wl as f64 - 4.0);
    let m = m_ideal.round() as i64;

    (0..passes as i64)
        .map(|i| if i < m { wl as usize } else { wu as usize })
        .collect()
}

/// One circular box-blur pass with a sliding window sum
fn box_pass(colors: &[Color], radius: usize) -> Vec<Color> {
    if radius == 0 {
        return colors.to_vec();
    }
    let n = colors.len();
    let size = 2 * radius + 1;

    // Window starts centered on position 0
    let mut sum = Color::BLACK;
    for k in -(radius as i64)..=(radius as i64) {
        sum = sum + colors[k.rem_euclid(n as i64) as usize];
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n as i64 {
        out.push(sum / size as f64);
        let leaving = (i - radius as i64).rem_euclid(n as i64) as usize;
        let entering = (i + radius as i64 + 1).rem_euclid(n as i64) as usize;
        sum = sum + colors[entering] * 1.0 + colors[leaving] * -1.0;
    }
    out
}

impl Transform for FastBlurTransform {
    fn kind(&self) -> &'static str {
        "fastblur"
    }

    fn transform(&mut self, _time: f64, colors: &[Color]) -> Vec<Color> {
        let sigma = self.params.float("standarddev");
        let passes = self.params.long("passes").max(1) as usize;
        if sigma <= 0.0 || colors.is_empty() {
            return colors.to_vec();
        }

        let mut current = colors.to_vec();
        for size in box_sizes(sigma, passes) {
            current = box_pass(&current, (size - 1) / 2);
        }
        current
    }

    fn is_animated(&self) -> bool {
        self.params.has_bindings()
    }
}
