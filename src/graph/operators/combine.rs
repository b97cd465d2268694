//! Two-input arithmetic: add, multiply, mix.
//!
//! None of these clamp. With both inputs unconnected, Add yields
//! `DEFAULT + DEFAULT = (0, 0, 0, 2)` and Multiply yields `DEFAULT`.

use crate::graph::operator::Inputs;
use crate::graph::slot::{SlotDescriptor, PAIR_SLOTS};
use crate::image::Color;
use serde::{Deserialize, Serialize};

static MIX_SLOTS: &[SlotDescriptor] = &[
    SlotDescriptor::input("A"),
    SlotDescriptor::input("B"),
    SlotDescriptor::input("Factor"),
];

pub const MIX_FACTOR_SLOT: usize = 2;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AddOp;

impl AddOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        PAIR_SLOTS
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        inputs.sample(0, x, y) + inputs.sample(1, x, y)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MultiplyOp;

impl MultiplyOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        PAIR_SLOTS
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        inputs.sample(0, x, y) * inputs.sample(1, x, y)
    }
}

/// Linear blend from A (t = 0) to B (t = 1).
///
/// `t` is the luma of the Factor input when that slot is connected, else the
/// `factor` parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixOp {
    pub factor: f32,
}

impl Default for MixOp {
    fn default() -> Self {
        Self { factor: 0.5 }
    }
}

impl MixOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        MIX_SLOTS
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        let a = inputs.sample(0, x, y);
        let b = inputs.sample(1, x, y);
        let t = if inputs.is_connected(MIX_FACTOR_SLOT) {
            inputs.sample(MIX_FACTOR_SLOT, x, y).luma()
        } else {
            self.factor
        };
        a.lerp(b, t)
    }
}
