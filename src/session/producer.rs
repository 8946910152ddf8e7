//! Periodic frame producer
//!
//! A dedicated thread that pulls one payload from the [`FrameSource`] per
//! tick and feeds it to the [`MediaPipeline`]. Ticks are scheduled as
//! `previous + period`, so a slow tick is followed by catch-up ticks rather
//! than accumulated drift.
//!
//! The loop checks its own running flag once per iteration and never sleeps
//! longer than one period, which bounds cancellation latency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::media::{FrameSource, MediaPipeline, VideoFrame};
use crate::stats::{ProducerExit, ProducerStats};

/// Source shared between successive producer runs
pub type SharedSource = Arc<Mutex<Box<dyn FrameSource>>>;

/// Handle to a running producer thread
pub struct FrameProducer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<ProducerStats>>,
}

impl FrameProducer {
    /// Spawn the producer thread
    pub fn spawn(
        pipeline: Arc<dyn MediaPipeline>,
        source: SharedSource,
        period: Duration,
    ) -> std::io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("frame-producer".into())
            .spawn(move || run(flag, pipeline, source, period))?;

        tracing::debug!(period_us = period.as_micros() as u64, "Frame producer started");

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Whether the loop is still running
    ///
    /// Turns false on its own if the pipeline reports a flow error.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Signal the loop to exit and wait until it has
    ///
    /// After this returns no further `feed` call happens. Returns `None` if
    /// already stopped or if the thread panicked.
    pub fn stop(&mut self) -> Option<ProducerStats> {
        self.running.store(false, Ordering::Release);
        let handle = self.handle.take()?;

        match handle.join() {
            Ok(stats) => {
                tracing::info!(
                    frames = stats.frames_fed,
                    late_ticks = stats.late_ticks,
                    avg_fps = stats.average_fps(),
                    exit = ?stats.exit,
                    "Frame producer stopped"
                );
                Some(stats)
            }
            Err(_) => {
                tracing::error!("Frame producer thread panicked");
                None
            }
        }
    }
}

impl Drop for FrameProducer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    running: Arc<AtomicBool>,
    pipeline: Arc<dyn MediaPipeline>,
    source: SharedSource,
    period: Duration,
) -> ProducerStats {
    let mut stats = ProducerStats::new();
    let start = Instant::now();
    let mut next_tick = start;

    while running.load(Ordering::Acquire) {
        let now = Instant::now();
        if now < next_tick {
            thread::sleep((next_tick - now).min(period));
            continue;
        }

        next_tick += period;
        if now > next_tick {
            stats.late_ticks += 1;
        }

        let elapsed = now - start;
        let data = source.lock().produce(elapsed);
        let frame = VideoFrame::new(elapsed, period, data);

        if let Err(e) = pipeline.feed(frame) {
            tracing::warn!(error = %e, frames = stats.frames_fed, "Pipeline rejected frame, stopping producer");
            stats.exit = ProducerExit::FlowError(e);
            running.store(false, Ordering::Release);
            return stats;
        }
        stats.frames_fed += 1;
    }

    stats.exit = ProducerExit::Stopped;
    stats
}
