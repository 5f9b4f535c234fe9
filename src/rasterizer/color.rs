//! RGBA colors with saturating arithmetic, plus HSL conversion
//!
//! Lighting accumulates contributions with `*` and `+`, which clamp each
//! channel to [0, 255] instead of wrapping.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    pub const EGGSHELL: Color = Color { r: 200, g: 200, b: 200, a: 255 };
    /// Wireframe overlay color
    pub const WIREFRAME: Color = Color { r: 0, g: 169, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self { r: bytes[0], g: bytes[1], b: bytes[2], a: bytes[3] }
    }

    /// Convert to [u8; 4] for framebuffer
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    fn map(self, f: impl Fn(u8) -> f32) -> Color {
        let clamp = |v: f32| v.clamp(0.0, 255.0) as u8;
        Color {
            r: clamp(f(self.r)),
            g: clamp(f(self.g)),
            b: clamp(f(self.b)),
            a: clamp(f(self.a)),
        }
    }
}

/// Scale every channel (alpha included), saturating
impl Mul<f32> for Color {
    type Output = Color;
    fn mul(self, s: f32) -> Color {
        self.map(|c| c as f32 * s)
    }
}

/// Add a scalar to every channel, saturating
impl Add<f32> for Color {
    type Output = Color;
    fn add(self, s: f32) -> Color {
        self.map(|c| c as f32 + s)
    }
}

impl Add for Color {
    type Output = Color;
    fn add(self, other: Color) -> Color {
        Color {
            r: self.r.saturating_add(other.r),
            g: self.g.saturating_add(other.g),
            b: self.b.saturating_add(other.b),
            a: self.a.saturating_add(other.a),
        }
    }
}

/// HSL color. Hue is in [0, 1), not degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Hsla {
    pub h: f32,
    pub s: f32,
    pub l: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Hsla {
    pub fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l, a: 1.0 }
    }

    /// Blend towards `other` by `t` in [0, 1], taking the short way around the hue circle
    pub fn lerp(self, other: Hsla, t: f32) -> Hsla {
        let t = t.clamp(0.0, 1.0);
        let mut dh = other.h - self.h;
        if dh > 0.5 {
            dh -= 1.0;
        } else if dh < -0.5 {
            dh += 1.0;
        }
        Hsla {
            h: (self.h + dh * t).rem_euclid(1.0),
            s: self.s + (other.s - self.s) * t,
            l: self.l + (other.l - self.l) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

pub fn rgb_to_hsl(col: Color) -> Hsla {
    let r = col.r as f32 / 255.0;
    let g = col.g as f32 / 255.0;
    let b = col.b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);

    let lightness = (max + min) / 2.0;
    let chroma = max - min;
    let mut hue = 0.0;
    let mut saturation = 0.0;

    if chroma > 0.0 {
        if lightness != 0.0 && lightness != 1.0 {
            saturation = (max - lightness) / lightness.min(1.0 - lightness);
        }

        hue = if r > b && r > g {
            (g - b) / chroma
        } else if g > b {
            (b - r) / chroma + 2.0
        } else {
            (r - g) / chroma + 4.0
        };

        hue *= 60.0;
        if hue < 0.0 {
            hue += 360.0;
        }
    }

    // Whole degrees; 360 folds back onto 0 so hue stays in [0, 1)
    let hue = (hue.round() % 360.0) / 360.0;

    Hsla {
        h: hue,
        s: saturation,
        l: lightness,
        a: col.a as f32 / 255.0,
    }
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

pub fn hsl_to_rgb(hsl: Hsla) -> Color {
    let (r, g, b) = if hsl.s == 0.0 {
        (hsl.l, hsl.l, hsl.l)
    } else {
        let q = if hsl.l < 0.5 {
            hsl.l * (1.0 + hsl.s)
        } else {
            hsl.l + hsl.s - hsl.l * hsl.s
        };
        let p = 2.0 * hsl.l - q;
        (
            hue_to_rgb(p, q, hsl.h + 1.0 / 3.0),
            hue_to_rgb(p, q, hsl.h),
            hue_to_rgb(p, q, hsl.h - 1.0 / 3.0),
        )
    };

    let channel = |v: f32| (v * 256.0).floor().clamp(0.0, 255.0) as u8;
    Color::with_alpha(channel(r), channel(g), channel(b), channel(hsl.a))
}
