//! Single-slot frame mailbox between the capture thread and the evaluator.

use crate::image::PixelBuffer;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Holds at most one completed frame. Posting replaces an unconsumed frame,
/// so the consumer always gets the newest one and never sees a partial write.
#[derive(Clone)]
pub struct FrameMailbox {
    tx: Sender<PixelBuffer>,
    rx: Receiver<PixelBuffer>,
}

impl FrameMailbox {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }

    /// Post `frame`, discarding a frame nobody has taken yet.
    ///
    /// Returns `true` if an older frame was discarded.
    pub fn post(&self, frame: PixelBuffer) -> bool {
        let mut frame = frame;
        let mut replaced = false;
        loop {
            match self.tx.try_send(frame) {
                Ok(()) => return replaced,
                Err(TrySendError::Full(rejected)) => {
                    replaced |= self.rx.try_recv().is_ok();
                    frame = rejected;
                }
                // Both ends live in `self`.
                Err(TrySendError::Disconnected(_)) => return replaced,
            }
        }
    }

    /// Take the posted frame, if any.
    pub fn take(&self) -> Option<PixelBuffer> {
        self.rx.try_recv().ok()
    }

    /// Whether a frame is waiting.
    pub fn has_frame(&self) -> bool {
        !self.rx.is_empty()
    }
}

impl Default for FrameMailbox {
    fn default() -> Self {
        Self::new()
    }
}
