//! Camera capture producer
//!
//! A background thread polls a capture device and hands completed frames to
//! the evaluator through a single-slot mailbox. Evaluation never waits on the
//! device: a pass uses whatever frame was most recently completed.
//!
//! # Components
//!
//! - [`CaptureBackend`] / [`FrameSource`] - device abstraction
//! - [`MockCaptureBackend`] - deterministic test patterns, no hardware needed
//! - [`CaptureWorker`] - the polling loop run on the capture thread
//! - [`CaptureProducer`] - owns the thread; stopping joins it
//! - [`CameraFeed`] - evaluator-side latest-frame holder

pub mod feed;
pub mod mailbox;
pub mod mock_source;
pub mod source;
pub mod worker;

pub use feed::CameraFeed;
pub use mailbox::FrameMailbox;
pub use mock_source::{MockCaptureBackend, MockFramePattern, MockFrameSource};
pub use source::{CaptureBackend, CaptureError, CaptureResult, FrameSource, RawFrame};
pub use worker::{CaptureStats, CaptureWorker};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Handle to a running capture thread.
///
/// Dropping the producer stops the thread and waits for it to exit.
pub struct CaptureProducer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<CaptureStats>>,
}

impl CaptureProducer {
    /// Open a device on `backend` and start polling it into `mailbox`.
    pub fn start(
        backend: &dyn CaptureBackend,
        mailbox: FrameMailbox,
        poll_rate_hz: u32,
    ) -> CaptureResult<Self> {
        let source = backend.open()?;
        tracing::info!(
            backend = backend.name(),
            device = source.name(),
            poll_rate_hz,
            "Starting capture"
        );

        let running = Arc::new(AtomicBool::new(true));
        let worker = CaptureWorker::new(source, mailbox, running.clone(), poll_rate_hz);
        let handle = std::thread::Builder::new()
            .name("pixelgraph-capture".to_string())
            .spawn(move || worker.run())?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some() && self.running.load(Ordering::SeqCst)
    }

    /// Signal the worker and join it. Idempotent.
    pub fn stop(&mut self) -> Option<CaptureStats> {
        self.running.store(false, Ordering::SeqCst);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                tracing::error!("Capture thread panicked");
                None
            }
        }
    }
}

impl Drop for CaptureProducer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_producer_delivers_frames_and_joins() {
        let backend = MockCaptureBackend::new(MockFramePattern::Solid([255, 0, 0]), 4, 4);
        let feed = CameraFeed::new();
        let mut producer = CaptureProducer::start(&backend, feed.mailbox(), 200).unwrap();
        assert!(producer.is_running());

        let deadline = Instant::now() + Duration::from_secs(5);
        while !feed.has_new_frame() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        let frame = feed.latest();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.get(0, 0), crate::image::Color::rgb(1.0, 0.0, 0.0));

        let stats = producer.stop().unwrap();
        assert!(stats.frames_posted >= 1);
        assert!(!producer.is_running());
        assert!(producer.stop().is_none());
    }

    #[test]
    fn test_start_fails_without_device() {
        let backend = MockCaptureBackend::unavailable();
        let result = CaptureProducer::start(&backend, FrameMailbox::new(), 10);
        assert!(matches!(result, Err(CaptureError::DeviceUnavailable(_))));
    }
}
