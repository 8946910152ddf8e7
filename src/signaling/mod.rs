//! Offer/answer signaling
//!
//! The dispatcher is the only writer of negotiation state and the only
//! caller of the session lifecycle. Everything else talks to it through
//! [`SignalingEvent`]s.

pub mod dispatcher;
pub mod event;
pub mod message;
pub mod negotiation;

pub use dispatcher::{PeerInfo, SignalingDispatcher};
pub use event::{EventReceiver, EventSender, SignalingEvent};
pub use message::SignalMessage;
pub use negotiation::{NegotiationPhase, NegotiationState};
