//! Binary threshold on luma.

use super::window::{collect_window, window_radius};
use crate::graph::operator::Inputs;
use crate::graph::slot::{SlotDescriptor, SINGLE_SLOT};
use crate::image::Color;
use serde::{Deserialize, Serialize};

/// White where luma reaches the threshold, black elsewhere.
///
/// With `locally_adaptive` the threshold is scaled by the mean luma of the
/// `region_size`-square window (centre included).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdOp {
    pub threshold: f32,
    pub region_size: u32,
    pub locally_adaptive: bool,
}

impl Default for ThresholdOp {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            region_size: 3,
            locally_adaptive: false,
        }
    }
}

impl ThresholdOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        SINGLE_SLOT
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        let luma = inputs.sample(0, x, y).luma();
        let cutoff = if self.locally_adaptive {
            let window = collect_window(inputs, 0, x, y, window_radius(self.region_size));
            let mean = window.iter().map(Color::luma).sum::<f32>() / window.len() as f32;
            mean * self.threshold
        } else {
            self.threshold
        };
        if luma >= cutoff {
            Color::WHITE
        } else {
            Color::BLACK
        }
    }
}
