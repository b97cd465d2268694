//! 3x3 kernel convolution.

use super::window::collect_window;
use crate::graph::operator::Inputs;
use crate::graph::slot::{SlotDescriptor, SINGLE_SLOT};
use crate::image::Color;
use serde::{Deserialize, Serialize};

/// Named kernels. Weights are row-major, x varying fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KernelFilter {
    #[default]
    GaussianBlur,
    BoxBlur,
    Sharpen,
    EdgeGauss,
    EdgeLaplace,
    Emboss,
    EdgeEmboss,
}

impl KernelFilter {
    pub fn weights(&self) -> &'static [f32; 9] {
        match self {
            KernelFilter::GaussianBlur => &[
                0.0625, 0.125, 0.0625, //
                0.125, 0.25, 0.125, //
                0.0625, 0.125, 0.0625,
            ],
            KernelFilter::BoxBlur => &[0.111111; 9],
            KernelFilter::Sharpen => &[
                0.0, -1.0, 0.0, //
                -1.0, 5.0, -1.0, //
                0.0, -1.0, 0.0,
            ],
            KernelFilter::EdgeGauss => &[
                -0.0943852, -0.155615, -0.0943852, //
                -0.155615, 1.0, -0.155615, //
                -0.0943852, -0.155615, -0.0943852,
            ],
            KernelFilter::EdgeLaplace => &[
                0.0, -1.0, 0.0, //
                -1.0, 4.0, -1.0, //
                0.0, -1.0, 0.0,
            ],
            KernelFilter::Emboss => &[
                -2.0, -1.0, 0.0, //
                -1.0, 1.0, 1.0, //
                0.0, 1.0, 2.0,
            ],
            KernelFilter::EdgeEmboss => &[
                5.0, -3.0, -3.0, //
                5.0, 0.0, -3.0, //
                5.0, -3.0, -3.0,
            ],
        }
    }

    pub fn all() -> &'static [KernelFilter] {
        &[
            KernelFilter::GaussianBlur,
            KernelFilter::BoxBlur,
            KernelFilter::Sharpen,
            KernelFilter::EdgeGauss,
            KernelFilter::EdgeLaplace,
            KernelFilter::Emboss,
            KernelFilter::EdgeEmboss,
        ]
    }
}

/// Weighted sum of the 3x3 neighbourhood. RGB is clamped to `[0, 1]`;
/// alpha is taken from the centre sample.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvolveOp {
    pub filter: KernelFilter,
}

impl ConvolveOp {
    pub fn new(filter: KernelFilter) -> Self {
        Self { filter }
    }

    pub fn slots(&self) -> &'static [SlotDescriptor] {
        SINGLE_SLOT
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        let window = collect_window(inputs, 0, x, y, 1);
        let mut sum = Color::new(0.0, 0.0, 0.0, window[4].a);
        for (c, &k) in window.iter().zip(self.filter.weights()) {
            sum.r += c.r * k;
            sum.g += c.g * k;
            sum.b += c.b * k;
        }
        sum.clamp_rgb()
    }
}
