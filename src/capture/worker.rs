//! Capture worker loop
//!
//! Runs on its own thread, polling a [`FrameSource`] at a fixed rate and
//! posting each completed frame into the [`FrameMailbox`]. The loop exits
//! when the shared `running` flag is cleared.

use super::mailbox::FrameMailbox;
use super::source::FrameSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters reported when the worker exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames_posted: u64,
    /// Frames overwritten before the evaluator took them
    pub frames_replaced: u64,
    pub frames_rejected: u64,
}

pub struct CaptureWorker {
    source: Box<dyn FrameSource>,
    mailbox: FrameMailbox,
    running: Arc<AtomicBool>,
    poll_rate_hz: u32,
    last_poll_time: Instant,
    stats: CaptureStats,
}

impl CaptureWorker {
    pub fn new(
        source: Box<dyn FrameSource>,
        mailbox: FrameMailbox,
        running: Arc<AtomicBool>,
        poll_rate_hz: u32,
    ) -> Self {
        Self {
            source,
            mailbox,
            running,
            poll_rate_hz,
            last_poll_time: Instant::now(),
            stats: CaptureStats::default(),
        }
    }

    pub fn run(mut self) -> CaptureStats {
        tracing::info!(device = self.source.name(), "Capture worker started");

        while self.running.load(Ordering::SeqCst) {
            self.poll_once();
            self.rate_limit();
        }

        tracing::info!(
            frames = self.stats.frames_posted,
            replaced = self.stats.frames_replaced,
            "Capture worker stopped"
        );
        self.stats
    }

    /// Fetch one frame from the device and post it.
    fn poll_once(&mut self) {
        let Some(raw) = self.source.poll_frame() else {
            return;
        };

        match raw.to_buffer() {
            Some(frame) => {
                if self.mailbox.post(frame) {
                    self.stats.frames_replaced += 1;
                }
                self.stats.frames_posted += 1;
            }
            None => {
                self.stats.frames_rejected += 1;
                tracing::warn!(
                    width = raw.width,
                    height = raw.height,
                    bytes = raw.data.len(),
                    "Dropping frame with mismatched size"
                );
            }
        }
    }

    fn rate_limit(&mut self) {
        if self.poll_rate_hz == 0 {
            std::thread::yield_now();
            return;
        }

        let target_interval = Duration::from_micros(1_000_000 / self.poll_rate_hz as u64);
        let elapsed = self.last_poll_time.elapsed();

        if elapsed < target_interval {
            std::thread::sleep(target_interval - elapsed);
        }

        self.last_poll_time = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::source::RawFrame;

    struct ScriptedSource {
        frames: Vec<RawFrame>,
        running: Arc<AtomicBool>,
    }

    impl FrameSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn poll_frame(&mut self) -> Option<RawFrame> {
            let frame = self.frames.pop();
            if self.frames.is_empty() {
                self.running.store(false, Ordering::SeqCst);
            }
            frame
        }
    }

    #[test]
    fn test_worker_posts_and_rejects() {
        let running = Arc::new(AtomicBool::new(true));
        let mailbox = FrameMailbox::new();
        let source = ScriptedSource {
            // Popped from the back: good, bad, good
            frames: vec![
                RawFrame { width: 1, height: 1, data: vec![255, 255, 255] },
                RawFrame { width: 2, height: 2, data: vec![0; 3] },
                RawFrame { width: 1, height: 1, data: vec![0, 0, 0] },
            ],
            running: running.clone(),
        };

        let worker = CaptureWorker::new(Box::new(source), mailbox.clone(), running, 0);
        let stats = worker.run();

        assert_eq!(stats.frames_posted, 2);
        assert_eq!(stats.frames_replaced, 1);
        assert_eq!(stats.frames_rejected, 1);
        let frame = mailbox.take().unwrap();
        assert_eq!(frame.get(0, 0), crate::image::Color::WHITE);
    }
}
