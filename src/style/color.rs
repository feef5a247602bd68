//! Hex colour parsing, gradient interpolation and palette generation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

use crate::errors::{StyleError, StyleResult};

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?([a-fA-F0-9]{2})([a-fA-F0-9]{2})([a-fA-F0-9]{2})$")
        .expect("hex colour pattern is valid")
});

/// An opaque RGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn parse_hex(s: &str) -> StyleResult<Self> {
        let caps = HEX_COLOR
            .captures(s.trim())
            .ok_or_else(|| StyleError::InvalidColor(s.to_string()))?;
        let channel = |i: usize| {
            u8::from_str_radix(&caps[i], 16).map_err(|_| StyleError::InvalidColor(s.to_string()))
        };
        Ok(Color::rgb(channel(1)?, channel(2)?, channel(3)?))
    }

    /// Lenient parse used by gradients: anything unreadable is black.
    pub fn from_hex_or_black(s: &str) -> Self {
        Color::parse_hex(s).unwrap_or(Color::BLACK)
    }

    /// Build from HSL with `s` and `l` in percent.
    pub fn from_hsl(h: f64, s: f64, l: f64) -> Self {
        let s = s / 100.0;
        let l = l / 100.0;
        let a = s * l.min(1.0 - l);
        let f = |n: f64| {
            let k = (n + h / 30.0) % 12.0;
            let c = l - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0);
            to_channel(255.0 * c)
        };
        Color::rgb(f(0.0), f(8.0), f(4.0))
    }

    /// Per-channel linear interpolation. `t` is not limited to `[0, 1]`:
    /// extrapolated channels saturate at 0 and 255.
    pub fn interpolate(self, other: Color, t: f64) -> Self {
        let lerp = |a: u8, b: u8| to_channel(a as f64 + (b as f64 - a as f64) * t);
        Color::rgb(
            lerp(self.r, other.r),
            lerp(self.g, other.g),
            lerp(self.b, other.b),
        )
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

fn to_channel(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

/// Interpolate between two hex colours, treating unreadable endpoints as black.
pub fn interpolate_hex(min: &str, max: &str, ratio: f64) -> String {
    Color::from_hex_or_black(min)
        .interpolate(Color::from_hex_or_black(max), ratio)
        .to_hex()
}

/// `count` evenly spaced hues at 70% saturation and 50% lightness.
pub fn distinct_palette(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let hue = (i as f64 * 360.0 / count as f64) % 360.0;
            Color::from_hsl(hue, 70.0, 50.0).to_hex()
        })
        .collect()
}
