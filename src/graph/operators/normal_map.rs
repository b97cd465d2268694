//! Normal-map reconstruction from luma gradients.

use super::window::collect_window;
use crate::graph::operator::Inputs;
use crate::graph::slot::{SlotDescriptor, SINGLE_SLOT};
use crate::image::Color;
use serde::{Deserialize, Serialize};

/// Treats input luma as a height field and encodes its surface normal.
///
/// Gradients are Sobel differences over the 3x3 neighbourhood. The normal
/// `normalize(-gx * strength, -gy * strength, 1)` is packed into RGB as
/// `0.5 * n + 0.5`; alpha is 1. A flat input gives `(0.5, 0.5, 1)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalMapOp {
    pub strength: f32,
}

impl Default for NormalMapOp {
    fn default() -> Self {
        Self { strength: 1.0 }
    }
}

impl NormalMapOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        SINGLE_SLOT
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        let h: Vec<f32> = collect_window(inputs, 0, x, y, 1)
            .iter()
            .map(Color::luma)
            .collect();
        // h[0] h[1] h[2]
        // h[3] h[4] h[5]
        // h[6] h[7] h[8]
        let gx = (h[2] + 2.0 * h[5] + h[8]) - (h[0] + 2.0 * h[3] + h[6]);
        let gy = (h[6] + 2.0 * h[7] + h[8]) - (h[0] + 2.0 * h[1] + h[2]);

        let nx = -gx * self.strength;
        let ny = -gy * self.strength;
        let len = (nx * nx + ny * ny + 1.0).sqrt();
        Color::new(
            0.5 * nx / len + 0.5,
            0.5 * ny / len + 0.5,
            0.5 / len + 0.5,
            1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::operator::BufferInputs;
    use crate::image::{cell_center, PixelBuffer};

    fn run(buf: PixelBuffer) -> Color {
        let mut inputs = BufferInputs {
            buffers: vec![Some(buf)],
            camera: PixelBuffer::default(),
            step: (1.0 / 3.0, 1.0 / 3.0),
        };
        let c = cell_center(1, 3);
        NormalMapOp::default().sample(&mut inputs, c, c)
    }

    #[test]
    fn test_flat_field_points_up() {
        let n = run(PixelBuffer::filled(3, 3, Color::gray(0.4)));
        assert!((n.r - 0.5).abs() < 1e-6);
        assert!((n.g - 0.5).abs() < 1e-6);
        assert!((n.b - 1.0).abs() < 1e-6);
        assert_eq!(n.a, 1.0);
    }

    #[test]
    fn test_slope_tilts_normal_against_gradient() {
        // Height rises to the right, so the normal leans left (r < 0.5).
        let ramp = PixelBuffer::from_fn(3, 3, |x, _| Color::gray(x as f32 * 0.25));
        let n = run(ramp);
        assert!(n.r < 0.5);
        assert!((n.g - 0.5).abs() < 1e-6);
        assert!(n.b < 1.0);
    }
}
