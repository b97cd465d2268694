//! Operator abstraction for the node graph.
//!
//! Two-layer design:
//! - **`OperatorPlugin` trait** - for host-provided operators.
//! - **`BuiltinOperator` enum** - for the closed set of built-in kinds. Match
//!   arms dispatch statically on the per-pixel hot path.
//!
//! `AnyOperator` wraps either variant so the system can handle both uniformly.
//!
//! Every operator is a point-sampling rule: given a view of its resolved
//! inputs and a normalized coordinate, return one [`Color`]. Both evaluation
//! modes are built on this one rule.

use super::kind::OperatorKind;
use super::operators::{
    AddOp, BrightnessContrastOp, CameraSourceOp, ConstantColorOp, ConvolveOp, DilateOp, DistortOp,
    ErodeOp, FisheyeOp, GrayscaleOp, ImageSourceOp, InvertOp, MedianOp, MirrorOp, MixOp,
    MultiplyOp, NormalMapOp, OutputOp, ScriptOp, ThresholdOp,
};
use super::slot::SlotDescriptor;
use crate::image::{Color, PixelBuffer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Read access to an operator's resolved inputs during a pass.
pub trait Inputs {
    /// Value of `slot` at normalized `(x, y)`.
    ///
    /// Unconnected slots, coordinates outside `[0, 1)` and producers that are
    /// not resolvable in this pass (cycles) read as [`Color::DEFAULT`].
    fn sample(&mut self, slot: usize, x: f64, y: f64) -> Color;

    /// Whether `slot` is fed by a connection in this pass.
    fn is_connected(&self, slot: usize) -> bool;

    /// Normalized size of one output pixel, `(1 / width, 1 / height)`.
    fn pixel_step(&self) -> (f64, f64);

    /// Camera frame swapped in at the start of the pass.
    fn camera_frame(&self) -> &PixelBuffer;
}

/// Trait for host-provided operators.
pub trait OperatorPlugin: Send + Sync {
    /// Human-readable name of this operator.
    fn name(&self) -> &str;

    /// Input slot descriptors.
    fn slots(&self) -> &[SlotDescriptor];

    /// Compute the output at normalized `(x, y)`.
    fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color;
}

/// Enum dispatch for built-in operators.
///
/// Serialized adjacently tagged so the kind tag and the parameters sit side
/// by side in graph documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params")]
pub enum BuiltinOperator {
    ConstantColor(ConstantColorOp),
    ImageSource(ImageSourceOp),
    CameraSource(CameraSourceOp),
    Add(AddOp),
    Multiply(MultiplyOp),
    Mix(MixOp),
    Threshold(ThresholdOp),
    Dilate(DilateOp),
    Erode(ErodeOp),
    Convolve(ConvolveOp),
    Median(MedianOp),
    BrightnessContrast(BrightnessContrastOp),
    Invert(InvertOp),
    Grayscale(GrayscaleOp),
    Mirror(MirrorOp),
    Fisheye(FisheyeOp),
    Distort(DistortOp),
    NormalMap(NormalMapOp),
    Script(ScriptOp),
    Output(OutputOp),
}

impl BuiltinOperator {
    /// Default-parameter operator of `kind`. `None` for [`OperatorKind::Plugin`].
    pub fn with_defaults(kind: OperatorKind) -> Option<Self> {
        let op = match kind {
            OperatorKind::ConstantColor => ConstantColorOp::default().into(),
            OperatorKind::ImageSource => ImageSourceOp::default().into(),
            OperatorKind::CameraSource => CameraSourceOp.into(),
            OperatorKind::Add => AddOp.into(),
            OperatorKind::Multiply => MultiplyOp.into(),
            OperatorKind::Mix => MixOp::default().into(),
            OperatorKind::Threshold => ThresholdOp::default().into(),
            OperatorKind::Dilate => DilateOp::default().into(),
            OperatorKind::Erode => ErodeOp::default().into(),
            OperatorKind::Convolve => ConvolveOp::default().into(),
            OperatorKind::Median => MedianOp::default().into(),
            OperatorKind::BrightnessContrast => BrightnessContrastOp::default().into(),
            OperatorKind::Invert => InvertOp.into(),
            OperatorKind::Grayscale => GrayscaleOp.into(),
            OperatorKind::Mirror => MirrorOp::default().into(),
            OperatorKind::Fisheye => FisheyeOp::default().into(),
            OperatorKind::Distort => DistortOp::default().into(),
            OperatorKind::NormalMap => NormalMapOp::default().into(),
            OperatorKind::Script => ScriptOp::default().into(),
            OperatorKind::Output => OutputOp.into(),
            OperatorKind::Plugin => return None,
        };
        Some(op)
    }

    pub fn kind(&self) -> OperatorKind {
        match self {
            BuiltinOperator::ConstantColor(_) => OperatorKind::ConstantColor,
            BuiltinOperator::ImageSource(_) => OperatorKind::ImageSource,
            BuiltinOperator::CameraSource(_) => OperatorKind::CameraSource,
            BuiltinOperator::Add(_) => OperatorKind::Add,
            BuiltinOperator::Multiply(_) => OperatorKind::Multiply,
            BuiltinOperator::Mix(_) => OperatorKind::Mix,
            BuiltinOperator::Threshold(_) => OperatorKind::Threshold,
            BuiltinOperator::Dilate(_) => OperatorKind::Dilate,
            BuiltinOperator::Erode(_) => OperatorKind::Erode,
            BuiltinOperator::Convolve(_) => OperatorKind::Convolve,
            BuiltinOperator::Median(_) => OperatorKind::Median,
            BuiltinOperator::BrightnessContrast(_) => OperatorKind::BrightnessContrast,
            BuiltinOperator::Invert(_) => OperatorKind::Invert,
            BuiltinOperator::Grayscale(_) => OperatorKind::Grayscale,
            BuiltinOperator::Mirror(_) => OperatorKind::Mirror,
            BuiltinOperator::Fisheye(_) => OperatorKind::Fisheye,
            BuiltinOperator::Distort(_) => OperatorKind::Distort,
            BuiltinOperator::NormalMap(_) => OperatorKind::NormalMap,
            BuiltinOperator::Script(_) => OperatorKind::Script,
            BuiltinOperator::Output(_) => OperatorKind::Output,
        }
    }

    /// Display name; scripts report the name they declare.
    pub fn name(&self) -> &str {
        match self {
            BuiltinOperator::Script(op) => op.name(),
            other => other.kind().display_name(),
        }
    }

    pub fn slots(&self) -> &[SlotDescriptor] {
        match self {
            BuiltinOperator::ConstantColor(op) => op.slots(),
            BuiltinOperator::ImageSource(op) => op.slots(),
            BuiltinOperator::CameraSource(op) => op.slots(),
            BuiltinOperator::Add(op) => op.slots(),
            BuiltinOperator::Multiply(op) => op.slots(),
            BuiltinOperator::Mix(op) => op.slots(),
            BuiltinOperator::Threshold(op) => op.slots(),
            BuiltinOperator::Dilate(op) => op.slots(),
            BuiltinOperator::Erode(op) => op.slots(),
            BuiltinOperator::Convolve(op) => op.slots(),
            BuiltinOperator::Median(op) => op.slots(),
            BuiltinOperator::BrightnessContrast(op) => op.slots(),
            BuiltinOperator::Invert(op) => op.slots(),
            BuiltinOperator::Grayscale(op) => op.slots(),
            BuiltinOperator::Mirror(op) => op.slots(),
            BuiltinOperator::Fisheye(op) => op.slots(),
            BuiltinOperator::Distort(op) => op.slots(),
            BuiltinOperator::NormalMap(op) => op.slots(),
            BuiltinOperator::Script(op) => op.slots(),
            BuiltinOperator::Output(op) => op.slots(),
        }
    }

    #[inline]
    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        match self {
            BuiltinOperator::ConstantColor(op) => op.sample(inputs, x, y),
            BuiltinOperator::ImageSource(op) => op.sample(inputs, x, y),
            BuiltinOperator::CameraSource(op) => op.sample(inputs, x, y),
            BuiltinOperator::Add(op) => op.sample(inputs, x, y),
            BuiltinOperator::Multiply(op) => op.sample(inputs, x, y),
            BuiltinOperator::Mix(op) => op.sample(inputs, x, y),
            BuiltinOperator::Threshold(op) => op.sample(inputs, x, y),
            BuiltinOperator::Dilate(op) => op.sample(inputs, x, y),
            BuiltinOperator::Erode(op) => op.sample(inputs, x, y),
            BuiltinOperator::Convolve(op) => op.sample(inputs, x, y),
            BuiltinOperator::Median(op) => op.sample(inputs, x, y),
            BuiltinOperator::BrightnessContrast(op) => op.sample(inputs, x, y),
            BuiltinOperator::Invert(op) => op.sample(inputs, x, y),
            BuiltinOperator::Grayscale(op) => op.sample(inputs, x, y),
            BuiltinOperator::Mirror(op) => op.sample(inputs, x, y),
            BuiltinOperator::Fisheye(op) => op.sample(inputs, x, y),
            BuiltinOperator::Distort(op) => op.sample(inputs, x, y),
            BuiltinOperator::NormalMap(op) => op.sample(inputs, x, y),
            BuiltinOperator::Script(op) => op.sample(inputs, x, y),
            BuiltinOperator::Output(op) => op.sample(inputs, x, y),
        }
    }
}

macro_rules! impl_from_op {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for BuiltinOperator {
                fn from(op: $ty) -> Self {
                    BuiltinOperator::$variant(op)
                }
            }

            impl From<$ty> for AnyOperator {
                fn from(op: $ty) -> Self {
                    AnyOperator::Builtin(BuiltinOperator::$variant(op))
                }
            }
        )*
    };
}

impl_from_op!(
    ConstantColor(ConstantColorOp),
    ImageSource(ImageSourceOp),
    CameraSource(CameraSourceOp),
    Add(AddOp),
    Multiply(MultiplyOp),
    Mix(MixOp),
    Threshold(ThresholdOp),
    Dilate(DilateOp),
    Erode(ErodeOp),
    Convolve(ConvolveOp),
    Median(MedianOp),
    BrightnessContrast(BrightnessContrastOp),
    Invert(InvertOp),
    Grayscale(GrayscaleOp),
    Mirror(MirrorOp),
    Fisheye(FisheyeOp),
    Distort(DistortOp),
    NormalMap(NormalMapOp),
    Script(ScriptOp),
    Output(OutputOp),
);

/// Either a built-in operator (enum dispatch) or a plugin (trait object).
#[derive(Clone)]
pub enum AnyOperator {
    Builtin(BuiltinOperator),
    Plugin(Arc<dyn OperatorPlugin>),
}

impl AnyOperator {
    pub fn plugin(plugin: impl OperatorPlugin + 'static) -> Self {
        AnyOperator::Plugin(Arc::new(plugin))
    }

    pub fn kind(&self) -> OperatorKind {
        match self {
            AnyOperator::Builtin(op) => op.kind(),
            AnyOperator::Plugin(_) => OperatorKind::Plugin,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AnyOperator::Builtin(op) => op.name(),
            AnyOperator::Plugin(p) => p.name(),
        }
    }

    pub fn slots(&self) -> &[SlotDescriptor] {
        match self {
            AnyOperator::Builtin(op) => op.slots(),
            AnyOperator::Plugin(p) => p.slots(),
        }
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots().len()
    }

    pub fn slot_name(&self, slot: usize) -> Option<&str> {
        self.slots().get(slot).map(|s| s.name.as_ref())
    }

    #[inline]
    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        match self {
            AnyOperator::Builtin(op) => op.sample(inputs, x, y),
            AnyOperator::Plugin(p) => p.sample(inputs, x, y),
        }
    }

    pub fn as_builtin(&self) -> Option<&BuiltinOperator> {
        match self {
            AnyOperator::Builtin(op) => Some(op),
            AnyOperator::Plugin(_) => None,
        }
    }

    pub fn as_builtin_mut(&mut self) -> Option<&mut BuiltinOperator> {
        match self {
            AnyOperator::Builtin(op) => Some(op),
            AnyOperator::Plugin(_) => None,
        }
    }
}

impl From<BuiltinOperator> for AnyOperator {
    fn from(op: BuiltinOperator) -> Self {
        AnyOperator::Builtin(op)
    }
}

impl fmt::Debug for AnyOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyOperator::Builtin(op) => f.debug_tuple("Builtin").field(op).finish(),
            AnyOperator::Plugin(p) => f.debug_tuple("Plugin").field(&p.name()).finish(),
        }
    }
}

/// Fixed-input view for sampling a single operator outside a pass.
///
/// Every connected slot returns the same color regardless of coordinate.
#[cfg(test)]
pub(crate) struct ConstInputs {
    pub values: Vec<Option<Color>>,
    pub camera: PixelBuffer,
    pub step: (f64, f64),
}

#[cfg(test)]
impl ConstInputs {
    pub fn new(values: Vec<Option<Color>>) -> Self {
        Self {
            values,
            camera: PixelBuffer::default(),
            step: (0.25, 0.25),
        }
    }
}

#[cfg(test)]
impl Inputs for ConstInputs {
    fn sample(&mut self, slot: usize, x: f64, y: f64) -> Color {
        if !(0.0..1.0).contains(&x) || !(0.0..1.0).contains(&y) {
            return Color::DEFAULT;
        }
        self.values.get(slot).copied().flatten().unwrap_or(Color::DEFAULT)
    }

    fn is_connected(&self, slot: usize) -> bool {
        matches!(self.values.get(slot), Some(Some(_)))
    }

    fn pixel_step(&self) -> (f64, f64) {
        self.step
    }

    fn camera_frame(&self) -> &PixelBuffer {
        &self.camera
    }
}

/// View over a fixed buffer per slot, sampled with the grid rule.
#[cfg(test)]
pub(crate) struct BufferInputs {
    pub buffers: Vec<Option<PixelBuffer>>,
    pub camera: PixelBuffer,
    pub step: (f64, f64),
}

#[cfg(test)]
impl Inputs for BufferInputs {
    fn sample(&mut self, slot: usize, x: f64, y: f64) -> Color {
        match self.buffers.get(slot) {
            Some(Some(buf)) => buf.sample(x, y),
            _ => Color::DEFAULT,
        }
    }

    fn is_connected(&self, slot: usize) -> bool {
        matches!(self.buffers.get(slot), Some(Some(_)))
    }

    fn pixel_step(&self) -> (f64, f64) {
        self.step
    }

    fn camera_frame(&self) -> &PixelBuffer {
        &self.camera
    }
}
