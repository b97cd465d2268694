//! Frame source traits for the capture producer.
//!
//! A [`CaptureBackend`] opens a device and hands back a [`FrameSource`] that
//! the worker thread polls. Real devices and the mock backend both sit
//! behind these traits.

use crate::image::PixelBuffer;
use thiserror::Error;

/// Errors from opening or running a capture device.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to spawn capture thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

/// One frame in device layout: tightly packed 8-bit RGB, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RawFrame {
    /// Normalize to float color. `None` if `data` does not hold `width * height * 3` bytes.
    pub fn to_buffer(&self) -> Option<PixelBuffer> {
        PixelBuffer::from_rgb8(self.width, self.height, &self.data)
    }
}

/// An opened device, polled from the capture thread.
pub trait FrameSource: Send {
    /// Human-readable device name.
    fn name(&self) -> &str;

    /// Fetch a new frame if one is ready. Must not block for long.
    fn poll_frame(&mut self) -> Option<RawFrame>;
}

/// Factory for frame sources.
pub trait CaptureBackend: Send + Sync {
    fn name(&self) -> &str;

    fn open(&self) -> CaptureResult<Box<dyn FrameSource>>;
}
