//! Color algebra for the render pipeline
//!
//! Colors are RGBW plus straight (non-premultiplied) alpha, stored as f64.
//! The nominal range is [0, 1] per channel but values outside it are legal
//! until output time, which allows HDR-style intermediate math; `safe_*`
//! accessors and `to_raw` clamp at the boundary.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul};

/// Per-channel output correction multipliers, applied just before packing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Correction {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub w: f64,
}

impl Default for Correction {
    fn default() -> Self {
        Self {
            r: 1.0,
            g: 1.0,
            b: 1.0,
            w: 1.0,
        }
    }
}

/// Layer blend mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Alpha,
}

impl BlendMode {
    /// Parse a blend mode name; unknown names fall back to normal
    pub fn parse(name: &str) -> Self {
        match name {
            "multiply" => BlendMode::Multiply,
            "alpha" => BlendMode::Alpha,
            _ => BlendMode::Normal,
        }
    }

    /// Blend `fg` over `bg` using this mode
    pub fn blend(&self, bg: Color, fg: Color) -> Color {
        match self {
            BlendMode::Normal => Color::blend_normal(bg, fg),
            BlendMode::Multiply => Color::blend_mult(bg, fg),
            // Alpha mode uses the layer purely as a brightness mask
            BlendMode::Alpha => bg * fg.safe_a(),
        }
    }
}

/// An RGBW color with straight alpha
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default)]
    pub w: f64,
    #[serde(default = "default_alpha")]
    pub a: f64,
}

fn default_alpha() -> f64 {
    1.0
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    /// Opaque RGB color with no white channel
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r,
            g,
            b,
            w: 0.0,
            a: 1.0,
        }
    }

    pub const fn with_alpha(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, w: 0.0, a }
    }

    pub const fn rgbw(r: f64, g: f64, b: f64, w: f64, a: f64) -> Self {
        Self { r, g, b, w, a }
    }

    /// The fallback color used when external input can't be parsed
    pub fn default_color() -> Self {
        Color::WHITE
    }

    /// Parse `#rrggbb` or `rrggbb`; anything else yields the default color
    pub fn from_hex(hex: &str) -> Self {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 {
            return Self::default_color();
        }
        let parse = |s: &str| u8::from_str_radix(s, 16).ok();
        match (parse(&hex[0..2]), parse(&hex[2..4]), parse(&hex[4..6])) {
            (Some(r), Some(g), Some(b)) => Color::new(
                f64::from(r) / 255.0,
                f64::from(g) / 255.0,
                f64::from(b) / 255.0,
            ),
            _ => Self::default_color(),
        }
    }

    /// "Source over" compositing of `fg` on `bg`
    pub fn blend_normal(bg: Color, fg: Color) -> Color {
        // Easy cases short-circuit the general formula
        if fg.a >= 1.0 {
            return fg;
        } else if fg.a <= 0.0 {
            return bg;
        } else if bg.a <= 0.0 {
            return fg;
        } else if bg.a >= 1.0 {
            let inv = 1.0 - fg.a;
            return Color::rgbw(
                bg.r * inv + fg.r * fg.a,
                bg.g * inv + fg.g * fg.a,
                bg.b * inv + fg.b * fg.a,
                bg.w * inv + fg.w * fg.a,
                1.0,
            );
        }

        // Both sides carry partial alpha
        let a = fg.a + bg.a - fg.a * bg.a;
        let bg_scaled = bg.flatten_alpha();
        let fg_scaled = fg.flatten_alpha();

        let mut out = fg_scaled * fg.a + bg_scaled * (1.0 - fg.a);
        if a > 0.0 {
            out = out / a;
        }
        out.a = a;
        out
    }

    /// Component-wise product after alpha flattening
    pub fn blend_mult(bg: Color, fg: Color) -> Color {
        bg.flatten_alpha() * fg.flatten_alpha()
    }

    pub fn safe_r(&self) -> f64 {
        self.r.clamp(0.0, 1.0)
    }

    pub fn safe_g(&self) -> f64 {
        self.g.clamp(0.0, 1.0)
    }

    pub fn safe_b(&self) -> f64 {
        self.b.clamp(0.0, 1.0)
    }

    pub fn safe_w(&self) -> f64 {
        self.w.clamp(0.0, 1.0)
    }

    pub fn safe_a(&self) -> f64 {
        self.a.clamp(0.0, 1.0)
    }

    /// All channels clamped to [0, 1]
    pub fn as_safe(&self) -> Color {
        Color::rgbw(
            self.safe_r(),
            self.safe_g(),
            self.safe_b(),
            self.safe_w(),
            self.safe_a(),
        )
    }

    /// Fold alpha into the color channels, leaving alpha at 1
    pub fn flatten_alpha(&self) -> Color {
        let mut flattened = *self * self.a;
        flattened.a = 1.0;
        flattened
    }

    /// Scale the color channels, resetting alpha to 1
    pub fn scale(&self, factor: f64) -> Color {
        Color::rgbw(
            self.r * factor,
            self.g * factor,
            self.b * factor,
            self.w * factor,
            1.0,
        )
    }

    /// Flattened, clamped RGB triple as lowercase hex
    pub fn to_hex(&self) -> String {
        let flattened = self.flatten_alpha();
        format!(
            "{:02x}{:02x}{:02x}",
            (flattened.safe_r() * 255.0).round() as u8,
            (flattened.safe_g() * 255.0).round() as u8,
            (flattened.safe_b() * 255.0).round() as u8,
        )
    }

    pub fn to_hex_web(&self) -> String {
        format!("#{}", self.to_hex())
    }

    /// Pack to corrected (r, g, b, w) output bytes
    pub fn to_raw(&self, correction: &Correction) -> [u8; 4] {
        let flattened = self.flatten_alpha();
        let pack = |v: f64, mult: f64| ((v * mult).clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            pack(flattened.r, correction.r),
            pack(flattened.g, correction.g),
            pack(flattened.b, correction.b),
            pack(flattened.w, correction.w),
        ]
    }

    /// Convert to HSV; hue is degrees in [0, 360), or the sentinel -1 when
    /// saturation is zero. W and A are not part of the cylinder and must be
    /// carried by the caller.
    pub fn to_hsv(&self) -> (f64, f64, f64) {
        let safe = self.as_safe();
        let max_val = safe.r.max(safe.g).max(safe.b);
        let min_val = safe.r.min(safe.g).min(safe.b);
        let v = max_val;

        let delta = max_val - min_val;

        if max_val == 0.0 || delta == 0.0 {
            return (-1.0, 0.0, v);
        }
        let s = delta / max_val;

        let mut h = if safe.r == max_val {
            (safe.g - safe.b) / delta
        } else if safe.g == max_val {
            2.0 + (safe.b - safe.r) / delta
        } else {
            4.0 + (safe.r - safe.g) / delta
        };

        h *= 60.0;
        if h < 0.0 {
            h += 360.0;
        }

        (h, s, v)
    }

    /// Build a color from HSV plus explicit W and A channels
    pub fn from_hsv(h: f64, s: f64, v: f64, w: f64, a: f64) -> Color {
        if s == 0.0 {
            return Color::rgbw(v, v, v, w, a);
        }

        let h = h / 60.0;
        let i = h.floor();
        let f = h - i;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        let (r, g, b) = match i as i64 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Color::rgbw(r, g, b, w, a)
    }

    /// Channel-wise linear interpolation (including W and A)
    pub fn lerp(from: Color, to: Color, t: f64) -> Color {
        from * (1.0 - t) + to * t
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        if self.a == 1.0 && other.a == 1.0 {
            Color::rgbw(
                self.r + other.r,
                self.g + other.g,
                self.b + other.b,
                self.w + other.w,
                1.0,
            )
        } else {
            self.flatten_alpha() + other.flatten_alpha()
        }
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    // Scalar multiplication leaves alpha untouched
    fn mul(self, factor: f64) -> Color {
        Color::rgbw(
            self.r * factor,
            self.g * factor,
            self.b * factor,
            self.w * factor,
            self.a,
        )
    }
}

impl Div<f64> for Color {
    type Output = Color;

    fn div(self, divisor: f64) -> Color {
        Color::rgbw(
            self.r / divisor,
            self.g / divisor,
            self.b / divisor,
            self.w / divisor,
            self.a,
        )
    }
}

impl Mul<Color> for Color {
    type Output = Color;

    fn mul(self, other: Color) -> Color {
        if self.a == 1.0 && other.a == 1.0 {
            Color::rgbw(
                self.r * other.r,
                self.g * other.g,
                self.b * other.b,
                self.w * other.w,
                1.0,
            )
        } else {
            self.flatten_alpha() * other.flatten_alpha()
        }
    }
}
