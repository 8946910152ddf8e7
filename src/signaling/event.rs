//! Events marshalled onto the dispatcher thread

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::PipelineError;

/// Sending half of the dispatcher's inbound channel
pub type EventSender = mpsc::UnboundedSender<SignalingEvent>;

/// Receiving half of the dispatcher's inbound channel
pub type EventReceiver = mpsc::UnboundedReceiver<SignalingEvent>;

/// Create the dispatcher's inbound channel
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Everything the dispatcher reacts to, in arrival order
#[derive(Debug)]
pub enum SignalingEvent {
    /// A peer was admitted
    Connected {
        connection_id: u64,
        peer_addr: SocketAddr,
    },
    /// One complete application message from the admitted peer
    MessageReceived { connection_id: u64, data: Bytes },
    /// The admitted peer went away
    Disconnected { connection_id: u64 },
    /// The pipeline discovered a local candidate
    LocalCandidate {
        candidate: String,
        sdp_mline_index: u32,
    },
    /// The running pipeline failed or reached end of stream
    PipelineFailed { error: PipelineError },
    /// Process shutdown: stop the session, flush, and exit
    Shutdown,
}
