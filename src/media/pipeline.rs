//! Media pipeline contract
//!
//! The pipeline is everything downstream of the frame source: encoding,
//! packetization, the peer connection and its transport. This crate drives
//! it but never looks inside.
//!
//! Threading: `start`, `stop`, and the negotiation hooks are only called
//! from the signaling dispatcher thread. `feed` is only called from the frame
//! producer thread, and never after `stop` has been called. The local
//! candidate and error callbacks may be invoked from any thread.

use crate::error::{FlowError, PipelineError};

use super::frame::VideoFrame;

/// Invoked by the pipeline for each local ICE candidate it discovers
///
/// Arguments are the candidate line and its m-line index.
pub type CandidateCallback = Box<dyn Fn(String, u32) + Send + Sync>;

/// Invoked by a running pipeline when it fails or reaches end of stream
pub type ErrorCallback = Box<dyn Fn(PipelineError) + Send + Sync>;

/// Media pipeline driven by the session lifecycle
pub trait MediaPipeline: Send + Sync + 'static {
    /// Allocate resources and enter the active state
    fn start(&self) -> Result<(), PipelineError>;

    /// Release everything allocated by `start`
    fn stop(&self);

    /// Push one frame into the ingestion point
    fn feed(&self, frame: VideoFrame) -> Result<(), FlowError>;

    /// Register the sink for locally discovered candidates
    ///
    /// Replaces any previously registered callback.
    fn on_local_candidate(&self, callback: CandidateCallback);

    /// Register the sink for fatal runtime errors
    ///
    /// Replaces any previously registered callback. Reporting an error shuts
    /// the server down. Pipelines that never fail after `start` can keep the
    /// default, which drops the callback.
    fn on_error(&self, callback: ErrorCallback) {
        let _ = callback;
    }

    /// Apply a remote offer and return the local answer SDP
    fn ingest_remote_offer(&self, sdp: &str) -> Result<String, PipelineError>;

    /// Add a remote candidate; fire and forget
    fn ingest_remote_candidate(&self, candidate: &str, sdp_mline_index: u32);
}
