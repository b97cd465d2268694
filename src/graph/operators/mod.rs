//! Built-in operator implementations.
//!
//! Each operator exposes `slots()` and `sample(inputs, x, y)`; `BuiltinOperator`
//! dispatches to them.

mod adjust;
mod combine;
mod convolve;
mod normal_map;
mod remap;
mod script;
mod source;
mod threshold;
mod window;

pub use adjust::{BrightnessContrastOp, GrayscaleOp, InvertOp};
pub use combine::{AddOp, MixOp, MultiplyOp, MIX_FACTOR_SLOT};
pub use convolve::{ConvolveOp, KernelFilter};
pub use normal_map::NormalMapOp;
pub use remap::{DistortOp, FisheyeOp, MirrorOp};
pub use script::ScriptOp;
pub use source::{CameraSourceOp, ConstantColorOp, ImageSourceOp, OutputOp};
pub use threshold::ThresholdOp;
pub use window::{DilateOp, ErodeOp, MedianOp, DEFAULT_WINDOW_SIZE, MAX_WINDOW_RADIUS};
