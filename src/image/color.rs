//! Four-channel floating-point color.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

/// Linear RGBA color with `f32` channels.
///
/// Channels are nominally in `[0, 1]`, but arithmetic operators (add,
/// multiply) are allowed to leave that range; only operators whose math is
/// documented as clamping bring values back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Value read from unconnected slots, out-of-bounds pixels and empty frames.
    pub const DEFAULT: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Opaque gray with all three channels set to `v`.
    pub const fn gray(v: f32) -> Self {
        Self::new(v, v, v, 1.0)
    }

    /// Rec.601 luma.
    #[inline]
    pub fn luma(&self) -> f32 {
        0.299 * self.r + 0.587 * self.g + 0.114 * self.b
    }

    /// Apply `f` to the color channels, keeping alpha.
    #[inline]
    pub fn map_rgb(self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(f(self.r), f(self.g), f(self.b), self.a)
    }

    /// Clamp the color channels to `[0, 1]`, keeping alpha.
    #[inline]
    pub fn clamp_rgb(self) -> Self {
        self.map_rgb(|c| c.clamp(0.0, 1.0))
    }

    /// Linear interpolation between `self` (t = 0) and `other` (t = 1), all four channels.
    #[inline]
    pub fn lerp(self, other: Color, t: f32) -> Self {
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    /// Quantize to 8-bit RGBA, clamping every channel.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Convert an 8-bit RGB triple to an opaque color.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    pub fn from_rgba8([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Color) -> Color {
        Color::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b, self.a + rhs.a)
    }
}

impl Mul for Color {
    type Output = Color;

    fn mul(self, rhs: Color) -> Color {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b, self.a * rhs.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_weights() {
        assert!((Color::WHITE.luma() - 1.0).abs() < 1e-6);
        assert_eq!(Color::BLACK.luma(), 0.0);
        assert!((Color::rgb(1.0, 0.0, 0.0).luma() - 0.299).abs() < 1e-6);
    }

    #[test]
    fn test_add_is_unclamped() {
        let sum = Color::DEFAULT + Color::DEFAULT;
        assert_eq!(sum, Color::new(0.0, 0.0, 0.0, 2.0));
    }

    #[test]
    fn test_clamp_rgb_keeps_alpha() {
        let c = Color::new(1.5, -0.2, 0.5, 0.25).clamp_rgb();
        assert_eq!(c, Color::new(1.0, 0.0, 0.5, 0.25));
    }

    #[test]
    fn test_rgba8_quantization() {
        assert_eq!(Color::new(2.0, 0.5, -1.0, 1.0).to_rgba8(), [255, 128, 0, 255]);
        assert_eq!(Color::from_rgb8(255, 0, 51), Color::rgb(1.0, 0.0, 0.2));
    }
}
