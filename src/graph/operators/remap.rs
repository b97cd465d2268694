//! Coordinate remapping: mirror, fisheye, distort.
//!
//! Each computes a new lookup coordinate and samples its primary input there.

use crate::graph::operator::Inputs;
use crate::graph::slot::{SlotDescriptor, SINGLE_SLOT};
use crate::image::Color;
use serde::{Deserialize, Serialize};

static DISTORT_SLOTS: &[SlotDescriptor] =
    &[SlotDescriptor::input("Image"), SlotDescriptor::input("Offset")];

/// Largest `f64` below 1.0; keeps the fold peak on the last grid cell.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// Triangle wave with period 2: rises on `[0, 1)`, falls back on `[1, 2)`.
/// The peak at odd integers maps just below 1 so it stays inside the image.
#[inline]
fn fold(f: f64) -> f64 {
    let m = f.rem_euclid(2.0);
    if m < 1.0 {
        m
    } else {
        (2.0 - m).min(BELOW_ONE)
    }
}

/// Shows the input, then its reflection, across the horizontal axis (and
/// the vertical one when `vertical` is set).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorOp {
    pub vertical: bool,
}

impl MirrorOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        SINGLE_SLOT
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        let mx = fold(x * 2.0);
        let my = if self.vertical { fold(y * 2.0) } else { y };
        inputs.sample(0, mx, my)
    }
}

/// Raises the polar radius to `quant` inside the unit disc centred on the image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FisheyeOp {
    pub quant: f32,
}

impl Default for FisheyeOp {
    fn default() -> Self {
        Self { quant: 1.0 }
    }
}

impl FisheyeOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        SINGLE_SLOT
    }

    /// Lookup coordinate for `(x, y)`.
    pub fn remap(&self, x: f64, y: f64) -> (f64, f64) {
        let px = x * 2.0 - 1.0;
        let py = y * 2.0 - 1.0;
        let radius = px.hypot(py);
        if radius >= 1.0 {
            return (x, y);
        }
        let theta = py.atan2(px);
        let r = radius.powf(self.quant as f64);
        (0.5 * (r * theta.cos() + 1.0), 0.5 * (r * theta.sin() + 1.0))
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        let (u, v) = self.remap(x, y);
        inputs.sample(0, u, v)
    }
}

/// Offsets the lookup by `strength * (2 * offset.rg - 1)`.
///
/// Without an Offset connection the image passes through undisplaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistortOp {
    pub strength: f32,
}

impl Default for DistortOp {
    fn default() -> Self {
        Self { strength: 0.1 }
    }
}

impl DistortOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        DISTORT_SLOTS
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        if !inputs.is_connected(1) {
            return inputs.sample(0, x, y);
        }
        let o = inputs.sample(1, x, y);
        let s = self.strength as f64;
        let u = x + s * (2.0 * o.r as f64 - 1.0);
        let v = y + s * (2.0 * o.g as f64 - 1.0);
        inputs.sample(0, u, v)
    }
}
