//! Square-window morphology: dilate, erode, median.
//!
//! Windows step one output pixel per cell (`Inputs::pixel_step`) and are
//! always odd-sized. Cells outside the image read `Color::DEFAULT`, so the
//! border behaves as if surrounded by opaque black.

use crate::graph::operator::Inputs;
use crate::graph::slot::{SlotDescriptor, SINGLE_SLOT};
use crate::image::Color;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW_SIZE: u32 = 3;

/// Largest window half-width. Sizes above `2 * MAX_WINDOW_RADIUS + 1` are
/// treated as that size.
pub const MAX_WINDOW_RADIUS: u32 = 32;

/// Half-width of an odd window derived from a user size (`size | 1`, at least 1).
#[inline]
pub(crate) fn window_radius(size: u32) -> i32 {
    ((size.max(1) | 1) / 2).min(MAX_WINDOW_RADIUS) as i32
}

/// Samples of `slot` in the window of `radius` around `(x, y)`, row-major.
pub(crate) fn collect_window(
    inputs: &mut dyn Inputs,
    slot: usize,
    x: f64,
    y: f64,
    radius: i32,
) -> Vec<Color> {
    let (sx, sy) = inputs.pixel_step();
    let radius = radius.clamp(0, MAX_WINDOW_RADIUS as i32);
    let side = radius as usize * 2 + 1;
    let mut samples = Vec::with_capacity(side * side);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            samples.push(inputs.sample(slot, x + dx as f64 * sx, y + dy as f64 * sy));
        }
    }
    samples
}

fn brightest(samples: &[Color]) -> Color {
    samples
        .iter()
        .copied()
        .reduce(|best, c| if c.luma() > best.luma() { c } else { best })
        .unwrap_or(Color::DEFAULT)
}

fn darkest(samples: &[Color]) -> Color {
    samples
        .iter()
        .copied()
        .reduce(|best, c| if c.luma() < best.luma() { c } else { best })
        .unwrap_or(Color::DEFAULT)
}

/// Middle element after a stable descending sort by luma.
fn median(mut samples: Vec<Color>) -> Color {
    samples.sort_by(|a, b| b.luma().total_cmp(&a.luma()));
    samples.get(samples.len() / 2).copied().unwrap_or(Color::DEFAULT)
}

/// Brightest sample (by luma) in the window. Ties keep the first in row-major order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DilateOp {
    pub size: u32,
}

impl Default for DilateOp {
    fn default() -> Self {
        Self {
            size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl DilateOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        SINGLE_SLOT
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        brightest(&collect_window(inputs, 0, x, y, window_radius(self.size)))
    }
}

/// Darkest sample (by luma) in the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErodeOp {
    pub size: u32,
}

impl Default for ErodeOp {
    fn default() -> Self {
        Self {
            size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl ErodeOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        SINGLE_SLOT
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        darkest(&collect_window(inputs, 0, x, y, window_radius(self.size)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedianOp {
    pub size: u32,
}

impl Default for MedianOp {
    fn default() -> Self {
        Self {
            size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl MedianOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        SINGLE_SLOT
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        median(collect_window(inputs, 0, x, y, window_radius(self.size)))
    }
}
