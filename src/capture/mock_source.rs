//! Mock capture device for tests and headless runs.
//!
//! Generates RGB8 frames from a deterministic pattern. Frames depend only on
//! the pattern, the frame size and the frame counter, so tests can predict
//! exactly what the evaluator will see.
//!
//! # Patterns
//!
//! - [`MockFramePattern::Solid`] - every pixel the same color
//! - [`MockFramePattern::Gradient`] - red ramps left to right, green top to bottom
//! - [`MockFramePattern::Checkerboard`] - black/white squares of `cell` pixels
//! - [`MockFramePattern::MovingBar`] - a white column that advances one pixel per frame

use super::source::{CaptureBackend, CaptureError, CaptureResult, FrameSource, RawFrame};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Pattern for generating mock frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFramePattern {
    Solid([u8; 3]),
    Gradient,
    Checkerboard { cell: usize },
    MovingBar,
}

impl Default for MockFramePattern {
    fn default() -> Self {
        MockFramePattern::Gradient
    }
}

impl MockFramePattern {
    /// RGB of pixel `(x, y)` in frame number `frame`.
    pub fn pixel(&self, x: usize, y: usize, width: usize, height: usize, frame: u64) -> [u8; 3] {
        match *self {
            MockFramePattern::Solid(rgb) => rgb,
            MockFramePattern::Gradient => {
                let ramp = |i: usize, n: usize| {
                    if n <= 1 {
                        0
                    } else {
                        (i * 255 / (n - 1)) as u8
                    }
                };
                [ramp(x, width), ramp(y, height), 0]
            }
            MockFramePattern::Checkerboard { cell } => {
                let cell = cell.max(1);
                if (x / cell + y / cell) % 2 == 0 {
                    [255, 255, 255]
                } else {
                    [0, 0, 0]
                }
            }
            MockFramePattern::MovingBar => {
                if width > 0 && x == (frame % width as u64) as usize {
                    [255, 255, 255]
                } else {
                    [0, 0, 0]
                }
            }
        }
    }

    pub fn render(&self, width: usize, height: usize, frame: u64) -> RawFrame {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&self.pixel(x, y, width, height, frame));
            }
        }
        RawFrame {
            width,
            height,
            data,
        }
    }
}

/// Opened mock device.
pub struct MockFrameSource {
    pattern: MockFramePattern,
    width: usize,
    height: usize,
    frame: u64,
}

impl MockFrameSource {
    pub fn new(pattern: MockFramePattern, width: usize, height: usize) -> Self {
        Self {
            pattern,
            width,
            height,
            frame: 0,
        }
    }
}

impl FrameSource for MockFrameSource {
    fn name(&self) -> &str {
        "Mock Camera"
    }

    fn poll_frame(&mut self) -> Option<RawFrame> {
        let raw = self.pattern.render(self.width, self.height, self.frame);
        self.frame += 1;
        Some(raw)
    }
}

/// Backend that opens [`MockFrameSource`]s.
#[derive(Debug, Clone)]
pub struct MockCaptureBackend {
    pub pattern: MockFramePattern,
    pub width: usize,
    pub height: usize,
    /// Refuse to open, simulating a missing device.
    pub unavailable: bool,
    opens: Arc<AtomicUsize>,
}

impl MockCaptureBackend {
    pub fn new(pattern: MockFramePattern, width: usize, height: usize) -> Self {
        Self {
            pattern,
            width,
            height,
            unavailable: false,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Number of successful `open` calls, shared between clones.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl Default for MockCaptureBackend {
    fn default() -> Self {
        Self::new(MockFramePattern::default(), 64, 48)
    }
}

impl CaptureBackend for MockCaptureBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn open(&self) -> CaptureResult<Box<dyn FrameSource>> {
        if self.unavailable {
            return Err(CaptureError::DeviceUnavailable(
                "mock device disabled".to_string(),
            ));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockFrameSource::new(
            self.pattern,
            self.width,
            self.height,
        )))
    }
}
