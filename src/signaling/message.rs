//! Signaling wire messages
//!
//! One JSON object per WebSocket text frame, discriminated by `type`:
//!
//! | type     | fields                              | direction |
//! |----------|-------------------------------------|-----------|
//! | `offer`  | `sdp`                               | inbound   |
//! | `answer` | `sdp`                               | outbound  |
//! | `ice`    | `candidate`, `sdpMLineIndex`        | both      |
//! | `ready`  | none                                | outbound  |
//!
//! Unknown types and missing required fields fail to decode; callers drop
//! such messages without replying.

use serde::{Deserialize, Serialize};

use crate::error::MessageError;
use crate::outbound::OutboundMessage;

/// A decoded signaling message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalMessage {
    /// Remote session description offer
    Offer { sdp: String },
    /// Local session description answer
    Answer { sdp: String },
    /// One ICE candidate
    Ice {
        candidate: String,
        /// Defaults to 0 when absent
        #[serde(rename = "sdpMLineIndex", default)]
        sdp_mline_index: u32,
    },
    /// Sent once right after the peer is admitted
    Ready,
}

impl SignalMessage {
    /// Decode a text frame
    pub fn decode(text: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode a raw frame payload, which must be UTF-8
    pub fn decode_bytes(data: &[u8]) -> Result<Self, MessageError> {
        let text = std::str::from_utf8(data).map_err(|_| MessageError::NotText)?;
        Self::decode(text)
    }

    /// Encode to JSON text
    pub fn encode(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode into a message for `connection_id`, ready for the outbound queue
    pub fn to_outbound(&self, connection_id: u64) -> Result<OutboundMessage, MessageError> {
        self.encode()
            .map(|text| OutboundMessage::new(connection_id, text))
    }

    /// The `type` discriminator
    pub fn kind(&self) -> &'static str {
        match self {
            SignalMessage::Offer { .. } => "offer",
            SignalMessage::Answer { .. } => "answer",
            SignalMessage::Ice { .. } => "ice",
            SignalMessage::Ready => "ready",
        }
    }
}
