//! Pipeline start/stop state machine
//!
//! Owns the pipeline's active state and the producer thread that feeds it.
//! Only the signaling dispatcher calls into this type, so no lock guards
//! [`PipelineState`].
//!
//! ```text
//!            start()                    stop()
//!   Idle ─────────────────► Active ─────────────────► Idle
//!          pipeline.start()         producer.stop() (join)
//!          spawn producer           pipeline.stop()
//! ```
//!
//! Both transitions are idempotent.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::media::{FrameSource, MediaPipeline};

use super::producer::{FrameProducer, SharedSource};

/// Whether the pipeline is allocated and being fed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing allocated
    Idle,
    /// Pipeline active and producer running
    Active,
}

/// Start/stop coordinator for the pipeline and its producer
pub struct SessionLifecycle {
    pipeline: Arc<dyn MediaPipeline>,
    source: SharedSource,
    frame_period: Duration,
    state: PipelineState,
    producer: Option<FrameProducer>,
    started_at: Option<Instant>,
}

impl SessionLifecycle {
    /// Create an idle lifecycle
    pub fn new(
        pipeline: Arc<dyn MediaPipeline>,
        source: Box<dyn FrameSource>,
        frame_period: Duration,
    ) -> Self {
        Self {
            pipeline,
            source: Arc::new(Mutex::new(source)),
            frame_period,
            state: PipelineState::Idle,
            producer: None,
            started_at: None,
        }
    }

    /// Current state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Check if the pipeline is active
    pub fn is_active(&self) -> bool {
        self.state == PipelineState::Active
    }

    /// Whether the producer loop is still feeding
    ///
    /// May be false while Active if the pipeline reported a flow error.
    pub fn is_producing(&self) -> bool {
        self.producer.as_ref().is_some_and(|p| p.is_running())
    }

    /// Time since the session became active
    pub fn duration(&self) -> Option<Duration> {
        self.started_at.map(|t| t.elapsed())
    }

    /// The pipeline this lifecycle drives
    pub fn pipeline(&self) -> &Arc<dyn MediaPipeline> {
        &self.pipeline
    }

    /// Allocate the pipeline and start feeding it
    ///
    /// No-op when already active. On failure the error is logged, the state
    /// stays Idle, and nothing is retried.
    pub fn start(&mut self) -> Result<()> {
        if self.state == PipelineState::Active {
            tracing::debug!("Session already active");
            return Ok(());
        }

        if let Err(e) = self.pipeline.start() {
            tracing::warn!(error = %e, "Pipeline start failed, session stays idle");
            return Err(Error::Pipeline(e));
        }

        let producer = match FrameProducer::spawn(
            Arc::clone(&self.pipeline),
            Arc::clone(&self.source),
            self.frame_period,
        ) {
            Ok(producer) => producer,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to spawn frame producer, session stays idle");
                self.pipeline.stop();
                return Err(Error::Io(e));
            }
        };

        self.producer = Some(producer);
        self.state = PipelineState::Active;
        self.started_at = Some(Instant::now());
        tracing::info!("Session started");

        Ok(())
    }

    /// Stop feeding and release the pipeline
    ///
    /// The producer is joined before the pipeline is released. No-op when
    /// idle.
    pub fn stop(&mut self) {
        if self.state == PipelineState::Idle {
            return;
        }

        if let Some(mut producer) = self.producer.take() {
            producer.stop();
        }
        self.pipeline.stop();

        let duration = self.duration().unwrap_or_default();
        self.state = PipelineState::Idle;
        self.started_at = None;
        tracing::info!(
            duration_ms = duration.as_millis() as u64,
            "Session stopped"
        );
    }
}

impl Drop for SessionLifecycle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use bytes::Bytes;

    use super::*;
    use crate::media::testing::{Call, RecordingPipeline};

    const PERIOD: Duration = Duration::from_millis(2);

    fn lifecycle(pipeline: &Arc<RecordingPipeline>) -> SessionLifecycle {
        let source: Box<dyn FrameSource> =
            Box::new(|_elapsed: Duration| Bytes::from_static(b"frame"));
        SessionLifecycle::new(pipeline.clone(), source, PERIOD)
    }

    #[test]
    fn test_start_twice_allocates_once() {
        let pipeline = Arc::new(RecordingPipeline::new());
        let mut session = lifecycle(&pipeline);

        session.start().unwrap();
        session.start().unwrap();

        assert_eq!(session.state(), PipelineState::Active);
        assert_eq!(pipeline.count(|c| *c == Call::Start), 1);
        assert!(session.is_producing());

        session.stop();
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let pipeline = Arc::new(RecordingPipeline::new());
        let mut session = lifecycle(&pipeline);

        session.stop();

        assert_eq!(session.state(), PipelineState::Idle);
        assert!(pipeline.calls().is_empty());
    }

    #[test]
    fn test_no_feed_after_release() {
        let pipeline = Arc::new(RecordingPipeline::new());
        let mut session = lifecycle(&pipeline);

        session.start().unwrap();
        thread::sleep(PERIOD * 10);
        session.stop();
        thread::sleep(PERIOD * 10);

        let calls = pipeline.calls();
        let stop_at = calls.iter().position(|c| *c == Call::Stop).unwrap();
        assert_eq!(stop_at, calls.len() - 1);
        assert!(pipeline.feeds() > 0);
        assert_eq!(session.state(), PipelineState::Idle);
        assert!(!session.is_producing());
    }

    #[test]
    fn test_start_failure_stays_idle_then_retries() {
        let pipeline = Arc::new(RecordingPipeline::failing_start());
        let mut session = lifecycle(&pipeline);

        assert!(matches!(session.start(), Err(Error::Pipeline(_))));
        assert_eq!(session.state(), PipelineState::Idle);
        assert!(!session.is_producing());

        pipeline.set_fail_start(false);
        session.start().unwrap();
        assert_eq!(session.state(), PipelineState::Active);
        assert_eq!(pipeline.count(|c| *c == Call::Start), 2);

        session.stop();
    }

    #[test]
    fn test_restart_after_stop() {
        let pipeline = Arc::new(RecordingPipeline::new());
        let mut session = lifecycle(&pipeline);

        session.start().unwrap();
        session.stop();
        session.start().unwrap();
        session.stop();

        assert_eq!(pipeline.count(|c| *c == Call::Start), 2);
        assert_eq!(pipeline.count(|c| *c == Call::Stop), 2);
    }

    #[test]
    fn test_duration_tracks_active_session() {
        let pipeline = Arc::new(RecordingPipeline::new());
        let mut session = lifecycle(&pipeline);
        assert!(session.duration().is_none());

        session.start().unwrap();
        thread::sleep(PERIOD * 5);
        assert!(session.duration().unwrap() >= PERIOD * 5);

        session.stop();
        assert!(session.duration().is_none());
    }

    #[test]
    fn test_drop_releases_pipeline() {
        let pipeline = Arc::new(RecordingPipeline::new());
        {
            let mut session = lifecycle(&pipeline);
            session.start().unwrap();
        }
        assert_eq!(pipeline.calls().last(), Some(&Call::Stop));
    }
}
