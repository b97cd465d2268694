//! Source and terminal operators: constant color, bitmap, camera, output.

use crate::error::Result;
use crate::graph::operator::Inputs;
use crate::graph::slot::{SlotDescriptor, NO_SLOTS, SINGLE_SLOT};
use crate::image::{Color, PixelBuffer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fills every coordinate with one color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantColorOp {
    pub color: Color,
}

impl ConstantColorOp {
    pub fn new(color: Color) -> Self {
        Self { color }
    }

    pub fn slots(&self) -> &'static [SlotDescriptor] {
        NO_SLOTS
    }

    pub fn sample(&self, _inputs: &mut dyn Inputs, _x: f64, _y: f64) -> Color {
        self.color
    }
}

impl Default for ConstantColorOp {
    fn default() -> Self {
        Self::new(Color::DEFAULT)
    }
}

/// Nearest-samples a held bitmap.
///
/// Only `path` is persisted; the pixels are reloaded from it when a document
/// is restored. Bitmaps set in memory without a path do not survive a save.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ImageSourceOp {
    pub path: Option<PathBuf>,
    #[serde(skip)]
    bitmap: Arc<PixelBuffer>,
}

impl ImageSourceOp {
    pub fn from_buffer(bitmap: PixelBuffer) -> Self {
        Self {
            path: None,
            bitmap: Arc::new(bitmap),
        }
    }

    /// Decode `path` and remember it for persistence.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bitmap = PixelBuffer::open(path)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            bitmap: Arc::new(bitmap),
        })
    }

    /// Re-read the bitmap from `path`. No-op without a path.
    pub fn reload(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            self.bitmap = Arc::new(PixelBuffer::open(path)?);
        }
        Ok(())
    }

    pub fn set_bitmap(&mut self, bitmap: PixelBuffer) {
        self.bitmap = Arc::new(bitmap);
    }

    pub fn bitmap(&self) -> &PixelBuffer {
        &self.bitmap
    }

    pub fn slots(&self) -> &'static [SlotDescriptor] {
        NO_SLOTS
    }

    pub fn sample(&self, _inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        self.bitmap.sample(x, y)
    }
}

impl fmt::Debug for ImageSourceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSourceOp")
            .field("path", &self.path)
            .field("width", &self.bitmap.width())
            .field("height", &self.bitmap.height())
            .finish()
    }
}

/// Samples the live camera frame of the current pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CameraSourceOp;

impl CameraSourceOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        NO_SLOTS
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        inputs.camera_frame().sample(x, y)
    }
}

/// Terminal operator. Passes its single input through.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OutputOp;

impl OutputOp {
    pub fn slots(&self) -> &'static [SlotDescriptor] {
        SINGLE_SLOT
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        inputs.sample(0, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::operator::ConstInputs;

    #[test]
    fn test_image_source_nearest_sampling() {
        let bitmap = PixelBuffer::from_pixels(2, 1, vec![Color::WHITE, Color::BLACK]).unwrap();
        let op = ImageSourceOp::from_buffer(bitmap);
        let mut inputs = ConstInputs::new(vec![]);
        // floor(2.5 * x)
        assert_eq!(op.sample(&mut inputs, 0.1, 0.5), Color::WHITE);
        assert_eq!(op.sample(&mut inputs, 0.39, 0.5), Color::WHITE);
        assert_eq!(op.sample(&mut inputs, 0.41, 0.5), Color::BLACK);
        assert_eq!(op.sample(&mut inputs, 0.99, 0.5), Color::BLACK);
    }

    #[test]
    fn test_empty_image_source_reads_default() {
        let op = ImageSourceOp::default();
        let mut inputs = ConstInputs::new(vec![]);
        assert_eq!(op.sample(&mut inputs, 0.5, 0.5), Color::DEFAULT);
    }

    #[test]
    fn test_camera_source_reads_frame() {
        let op = CameraSourceOp;
        let mut inputs = ConstInputs::new(vec![]);
        assert_eq!(op.sample(&mut inputs, 0.5, 0.5), Color::DEFAULT);

        inputs.camera = PixelBuffer::filled(4, 4, Color::rgb(0.0, 1.0, 0.0));
        assert_eq!(op.sample(&mut inputs, 0.5, 0.5), Color::rgb(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_output_passes_through() {
        let mut inputs = ConstInputs::new(vec![Some(Color::rgb(0.2, 0.4, 0.6))]);
        assert_eq!(OutputOp.sample(&mut inputs, 0.5, 0.5), Color::rgb(0.2, 0.4, 0.6));

        let mut unconnected = ConstInputs::new(vec![None]);
        assert_eq!(OutputOp.sample(&mut unconnected, 0.5, 0.5), Color::DEFAULT);
    }

    #[test]
    fn test_image_source_persists_path_only() {
        let mut op = ImageSourceOp::from_buffer(PixelBuffer::filled(2, 2, Color::WHITE));
        op.path = Some(PathBuf::from("textures/brick.png"));
        let json = serde_json::to_string(&op).unwrap();
        let back: ImageSourceOp = serde_json::from_str(&json).unwrap();
        assert_eq!(back.path, op.path);
        assert!(back.bitmap().is_empty());
    }
}
