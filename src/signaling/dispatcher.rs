//! Signaling dispatcher
//!
//! The single thread that owns all session-affecting state. Events from the
//! network task and from pipeline callbacks arrive over one channel and are
//! handled one at a time, each to completion, so [`NegotiationState`] and
//! the lifecycle's pipeline state need no locks.
//!
//! ```text
//!   connection task ──┐                          ┌──► SessionLifecycle
//!                     ├──► mpsc ──► dispatcher ──┤
//!   pipeline (ICE,  ──┘                          └──► OutboundQueue
//!            errors)
//! ```

use std::net::SocketAddr;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use bytes::Bytes;

use crate::error::PipelineError;
use crate::outbound::OutboundQueue;
use crate::server::RunningFlag;
use crate::session::SessionLifecycle;

use super::event::{EventReceiver, EventSender, SignalingEvent};
use super::message::SignalMessage;
use super::negotiation::NegotiationState;

/// The admitted peer as seen by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerInfo {
    /// Connection ID assigned by the listener
    pub connection_id: u64,
    /// Remote address
    pub peer_addr: SocketAddr,
}

/// Owner of negotiation state and the session lifecycle
pub struct SignalingDispatcher {
    lifecycle: SessionLifecycle,
    outbound: Arc<OutboundQueue>,
    running: RunningFlag,
    peer: Option<PeerInfo>,
    negotiation: Option<NegotiationState>,
}

impl SignalingDispatcher {
    /// Create a dispatcher
    ///
    /// Registers pipeline callbacks that post [`SignalingEvent::LocalCandidate`]
    /// and [`SignalingEvent::PipelineFailed`] back through `events`. A fatal
    /// pipeline error clears `running`.
    pub fn new(
        lifecycle: SessionLifecycle,
        outbound: Arc<OutboundQueue>,
        events: EventSender,
        running: RunningFlag,
    ) -> Self {
        let candidates = events.clone();
        lifecycle
            .pipeline()
            .on_local_candidate(Box::new(move |candidate, sdp_mline_index| {
                let _ = candidates.send(SignalingEvent::LocalCandidate {
                    candidate,
                    sdp_mline_index,
                });
            }));
        lifecycle.pipeline().on_error(Box::new(move |error| {
            let _ = events.send(SignalingEvent::PipelineFailed { error });
        }));

        Self {
            lifecycle,
            outbound,
            running,
            peer: None,
            negotiation: None,
        }
    }

    /// Run the dispatcher on its own thread until a shutdown event
    pub fn spawn(self, events: EventReceiver) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("signaling-dispatcher".into())
            .spawn(move || self.run(events))
    }

    /// Consume events until [`SignalingEvent::Shutdown`] or channel close
    pub fn run(mut self, mut events: EventReceiver) {
        while let Some(event) = events.blocking_recv() {
            if self.handle(event).is_break() {
                return;
            }
        }
        self.shutdown();
    }

    /// Handle one event to completion
    pub fn handle(&mut self, event: SignalingEvent) -> ControlFlow<()> {
        match event {
            SignalingEvent::Connected {
                connection_id,
                peer_addr,
            } => self.on_connected(PeerInfo {
                connection_id,
                peer_addr,
            }),
            SignalingEvent::MessageReceived {
                connection_id,
                data,
            } => self.on_message(connection_id, data),
            SignalingEvent::Disconnected { connection_id } => self.on_disconnected(connection_id),
            SignalingEvent::LocalCandidate {
                candidate,
                sdp_mline_index,
            } => self.on_local_candidate(candidate, sdp_mline_index),
            SignalingEvent::PipelineFailed { error } => self.on_pipeline_failed(error),
            SignalingEvent::Shutdown => {
                self.shutdown();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// The admitted peer, if any
    pub fn peer(&self) -> Option<PeerInfo> {
        self.peer
    }

    /// Negotiation state of the admitted peer
    pub fn negotiation(&self) -> Option<&NegotiationState> {
        self.negotiation.as_ref()
    }

    /// The session lifecycle
    pub fn lifecycle(&self) -> &SessionLifecycle {
        &self.lifecycle
    }

    fn on_connected(&mut self, peer: PeerInfo) {
        tracing::info!(
            connection_id = peer.connection_id,
            peer = %peer.peer_addr,
            "Peer admitted"
        );

        self.peer = Some(peer);
        self.negotiation = Some(NegotiationState::new());

        // A failed start is logged by the lifecycle; the next connection retries
        let _ = self.lifecycle.start();
        self.send(SignalMessage::Ready);
    }

    fn on_message(&mut self, connection_id: u64, data: Bytes) {
        if self.peer.map(|p| p.connection_id) != Some(connection_id) {
            tracing::debug!(connection_id = connection_id, "Dropping message from stale connection");
            return;
        }

        let message = match SignalMessage::decode_bytes(&data) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(connection_id = connection_id, error = %e, "Dropping inbound message");
                return;
            }
        };

        match message {
            SignalMessage::Offer { sdp } => self.on_offer(&sdp),
            SignalMessage::Ice {
                candidate,
                sdp_mline_index,
            } => {
                tracing::trace!(sdp_mline_index = sdp_mline_index, "Remote candidate");
                self.negotiation
                    .get_or_insert_with(NegotiationState::new)
                    .on_remote_candidate();
                self.lifecycle
                    .pipeline()
                    .ingest_remote_candidate(&candidate, sdp_mline_index);
            }
            other => {
                tracing::debug!(kind = other.kind(), "Ignoring outbound-only message type");
            }
        }
    }

    fn on_offer(&mut self, sdp: &str) {
        let negotiation = self.negotiation.get_or_insert_with(NegotiationState::new);
        negotiation.on_offer();
        tracing::debug!(len = sdp.len(), "Remote offer received");

        match self.lifecycle.pipeline().ingest_remote_offer(sdp) {
            Ok(answer) => {
                negotiation.on_answer();
                self.send(SignalMessage::Answer { sdp: answer });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to answer remote offer");
            }
        }
    }

    fn on_local_candidate(&mut self, candidate: String, sdp_mline_index: u32) {
        let Some(negotiation) = self.negotiation.as_mut() else {
            tracing::debug!("Dropping local candidate, no peer admitted");
            return;
        };
        negotiation.on_local_candidate();

        self.send(SignalMessage::Ice {
            candidate,
            sdp_mline_index,
        });
    }

    fn on_pipeline_failed(&mut self, error: PipelineError) {
        // Errors raised while stopping arrive after the session is idle
        if !self.lifecycle.is_active() {
            tracing::debug!(error = %error, "Ignoring error from idle pipeline");
            return;
        }

        tracing::error!(error = %error, "Pipeline failed, shutting down");
        self.lifecycle.stop();
        self.running.stop();
    }

    fn on_disconnected(&mut self, connection_id: u64) {
        if self.peer.map(|p| p.connection_id) != Some(connection_id) {
            tracing::warn!(connection_id = connection_id, "Disconnect for unknown connection");
            return;
        }
        tracing::info!(connection_id = connection_id, "Peer disconnected");

        self.teardown();
    }

    fn shutdown(&mut self) {
        tracing::debug!("Dispatcher shutting down");
        self.teardown();
    }

    fn teardown(&mut self) {
        self.lifecycle.stop();
        self.peer = None;
        self.negotiation = None;

        let discarded = self.outbound.drain_all();
        if !discarded.is_empty() {
            tracing::debug!(count = discarded.len(), "Discarded undelivered messages");
        }
    }

    fn send(&self, message: SignalMessage) {
        let Some(peer) = self.peer else {
            tracing::debug!(kind = message.kind(), "Dropping message, no peer admitted");
            return;
        };

        match message.to_outbound(peer.connection_id) {
            Ok(outbound) => self.outbound.push(outbound),
            Err(e) => tracing::error!(kind = message.kind(), error = %e, "Failed to encode message"),
        }
    }
}
