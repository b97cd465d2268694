//! Per-pixel color adjustments.

use crate::graph::operator::Inputs;
use crate::graph::slot::{SlotDescriptor, SINGLE_SLOT};
use crate::image::Color;
use serde::{Deserialize, Serialize};

/// `clamp(value * contrast + brightness, 0, 1)` on RGB; alpha untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrightnessContrastOp {
    pub brightness: f32,
    pub contrast: f32,
}

impl Default for BrightnessContrastOp {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
        }
    }
}

impl BrightnessContrastOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        SINGLE_SLOT
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        inputs
            .sample(0, x, y)
            .map_rgb(|c| (c * self.contrast + self.brightness).clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InvertOp;

impl InvertOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        SINGLE_SLOT
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        inputs.sample(0, x, y).map_rgb(|c| 1.0 - c)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GrayscaleOp;

impl GrayscaleOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        SINGLE_SLOT
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        let c = inputs.sample(0, x, y);
        let l = c.luma();
        Color::new(l, l, l, c.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::operator::ConstInputs;

    #[test]
    fn test_brightness_contrast_clamps_rgb_only() {
        let op = BrightnessContrastOp {
            brightness: 0.5,
            contrast: 2.0,
        };
        let mut inputs = ConstInputs::new(vec![Some(Color::new(0.5, 0.0, -1.0, 0.3))]);
        assert_eq!(op.sample(&mut inputs, 0.5, 0.5), Color::new(1.0, 0.5, 0.0, 0.3));
    }

    #[test]
    fn test_brightness_contrast_defaults_are_identity() {
        let color = Color::rgb(0.2, 0.4, 0.6);
        let mut inputs = ConstInputs::new(vec![Some(color)]);
        assert_eq!(
            BrightnessContrastOp::default().sample(&mut inputs, 0.5, 0.5),
            color
        );
    }

    #[test]
    fn test_invert_keeps_alpha() {
        let mut inputs = ConstInputs::new(vec![Some(Color::new(1.0, 0.25, 0.0, 0.5))]);
        assert_eq!(
            InvertOp.sample(&mut inputs, 0.5, 0.5),
            Color::new(0.0, 0.75, 1.0, 0.5)
        );
        let mut unconnected = ConstInputs::new(vec![None]);
        assert_eq!(InvertOp.sample(&mut unconnected, 0.5, 0.5), Color::WHITE);
    }

    #[test]
    fn test_grayscale_uses_luma() {
        let mut inputs = ConstInputs::new(vec![Some(Color::rgb(0.0, 1.0, 0.0))]);
        let c = GrayscaleOp.sample(&mut inputs, 0.5, 0.5);
        assert!((c.r - 0.587).abs() < 1e-6);
        assert_eq!(c.r, c.g);
        assert_eq!(c.g, c.b);
    }
}
