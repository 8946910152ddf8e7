//! Per-connection offer/answer progress
//!
//! Lives only inside the dispatcher: created when a peer is admitted,
//! discarded when it disconnects, never shared across threads.

/// Offer/answer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationPhase {
    /// Admitted, no offer yet
    AwaitingOffer,
    /// Remote offer applied, answer not produced
    OfferReceived,
    /// Local answer produced and queued
    Answered,
}

/// Negotiation progress for the admitted peer
#[derive(Debug, Clone)]
pub struct NegotiationState {
    /// Current phase
    pub phase: NegotiationPhase,
    /// Offers received on this connection
    pub offers: u32,
    /// Remote candidates forwarded to the pipeline
    pub remote_candidates: u32,
    /// Local candidates sent to the peer
    pub local_candidates: u32,
}

impl NegotiationState {
    /// Fresh state for a newly admitted peer
    pub fn new() -> Self {
        Self {
            phase: NegotiationPhase::AwaitingOffer,
            offers: 0,
            remote_candidates: 0,
            local_candidates: 0,
        }
    }

    /// Record a remote offer
    ///
    /// A later offer on the same connection restarts negotiation.
    pub fn on_offer(&mut self) {
        self.offers += 1;
        self.phase = NegotiationPhase::OfferReceived;
    }

    /// Record that the local answer was queued
    pub fn on_answer(&mut self) {
        if self.phase == NegotiationPhase::OfferReceived {
            self.phase = NegotiationPhase::Answered;
        }
    }

    /// Record a remote candidate; accepted in any phase
    pub fn on_remote_candidate(&mut self) {
        self.remote_candidates += 1;
    }

    /// Record a local candidate sent to the peer
    pub fn on_local_candidate(&mut self) {
        self.local_candidates += 1;
    }

    /// Whether a remote offer has been received
    pub fn offer_received(&self) -> bool {
        self.offers > 0
    }

    /// Whether the local answer has been produced
    pub fn is_answered(&self) -> bool {
        self.phase == NegotiationPhase::Answered
    }
}

impl Default for NegotiationState {
    fn default() -> Self {
        Self::new()
    }
}
