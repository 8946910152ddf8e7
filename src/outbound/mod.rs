//! Outbound message path
//!
//! Every message destined for the peer goes through one [`OutboundQueue`].
//! Any context may push; only the connection that owns the socket pops.
//!
//! ```text
//!   SignalingDispatcher ──┐
//!                         ├──► OutboundQueue ──(writable)──► connection ──► WebSocket
//!   pipeline callbacks  ──┘
//! ```

pub mod message;
pub mod queue;

pub use message::OutboundMessage;
pub use queue::OutboundQueue;
