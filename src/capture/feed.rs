//! Evaluator-side view of the camera.

use super::mailbox::FrameMailbox;
use crate::image::PixelBuffer;
use std::sync::{Arc, Mutex, PoisonError};

/// Latest camera frame as seen by evaluation passes.
///
/// The capture thread only ever touches the mailbox. A pass calls
/// [`CameraFeed::latest`] once at its start and reads that frame for the
/// whole pass, so every CameraSource in one pass sees the same image.
pub struct CameraFeed {
    mailbox: FrameMailbox,
    current: Mutex<Arc<PixelBuffer>>,
}

impl CameraFeed {
    pub fn new() -> Self {
        Self {
            mailbox: FrameMailbox::new(),
            current: Mutex::new(Arc::new(PixelBuffer::default())),
        }
    }

    /// Producer end, handed to the capture worker.
    pub fn mailbox(&self) -> FrameMailbox {
        self.mailbox.clone()
    }

    /// Swap in a newly posted frame, if any, and return the current one.
    pub fn latest(&self) -> Arc<PixelBuffer> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(frame) = self.mailbox.take() {
            *current = Arc::new(frame);
        }
        current.clone()
    }

    /// Current frame without consuming a posted one.
    pub fn current(&self) -> Arc<PixelBuffer> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_new_frame(&self) -> bool {
        self.mailbox.has_frame()
    }

    /// Forget all frames. The next pass sees an empty image.
    pub fn reset(&self) {
        let _ = self.mailbox.take();
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) =
            Arc::new(PixelBuffer::default());
    }
}

impl Default for CameraFeed {
    fn default() -> Self {
        Self::new()
    }
}
