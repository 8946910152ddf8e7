//! Recording pipeline double for unit tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{FlowError, PipelineError};

use super::frame::VideoFrame;
use super::pipeline::{CandidateCallback, ErrorCallback, MediaPipeline};

/// One observed call into the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Start,
    Stop,
    Feed(Duration),
    Offer(String),
    Candidate(String, u32),
}

#[derive(Default)]
pub(crate) struct RecordingPipeline {
    calls: Mutex<Vec<Call>>,
    fail_start: AtomicBool,
    fail_offer: AtomicBool,
    feed_budget: Mutex<Option<usize>>,
    candidate_callback: Mutex<Option<CandidateCallback>>,
    error_callback: Mutex<Option<ErrorCallback>>,
}

impl RecordingPipeline {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_start() -> Self {
        let pipeline = Self::default();
        pipeline.fail_start.store(true, Ordering::SeqCst);
        pipeline
    }

    pub(crate) fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_offer(&self, fail: bool) {
        self.fail_offer.store(fail, Ordering::SeqCst);
    }

    /// Accept `n` more frames, then report a flow error
    pub(crate) fn limit_feeds(&self, n: usize) {
        *self.feed_budget.lock() = Some(n);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| matches(c)).count()
    }

    pub(crate) fn feeds(&self) -> usize {
        self.count(|c| matches!(c, Call::Feed(_)))
    }

    /// Simulate the pipeline discovering a local candidate
    pub(crate) fn emit_local_candidate(&self, candidate: &str, index: u32) {
        if let Some(callback) = self.candidate_callback.lock().as_ref() {
            callback(candidate.to_string(), index);
        }
    }

    /// Simulate a fatal runtime error on the pipeline bus
    pub(crate) fn emit_error(&self, error: PipelineError) {
        if let Some(callback) = self.error_callback.lock().as_ref() {
            callback(error);
        }
    }
}

impl MediaPipeline for RecordingPipeline {
    fn start(&self) -> Result<(), PipelineError> {
        self.calls.lock().push(Call::Start);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(PipelineError::Allocation("test double".into()));
        }
        Ok(())
    }

    fn stop(&self) {
        self.calls.lock().push(Call::Stop);
    }

    fn feed(&self, frame: VideoFrame) -> Result<(), FlowError> {
        let mut budget = self.feed_budget.lock();
        if let Some(remaining) = budget.as_mut() {
            if *remaining == 0 {
                return Err(FlowError::Flushing);
            }
            *remaining -= 1;
        }
        self.calls.lock().push(Call::Feed(frame.pts));
        Ok(())
    }

    fn on_local_candidate(&self, callback: CandidateCallback) {
        *self.candidate_callback.lock() = Some(callback);
    }

    fn on_error(&self, callback: ErrorCallback) {
        *self.error_callback.lock() = Some(callback);
    }

    fn ingest_remote_offer(&self, sdp: &str) -> Result<String, PipelineError> {
        self.calls.lock().push(Call::Offer(sdp.to_string()));
        if self.fail_offer.load(Ordering::SeqCst) {
            return Err(PipelineError::Negotiation("test double".into()));
        }
        Ok(format!("answer to {}", sdp))
    }

    fn ingest_remote_candidate(&self, candidate: &str, sdp_mline_index: u32) {
        self.calls
            .lock()
            .push(Call::Candidate(candidate.to_string(), sdp_mline_index));
    }
}
