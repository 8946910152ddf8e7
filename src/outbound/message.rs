//! Outbound message payload

use std::fmt;

/// An immutable, already-encoded message waiting to be written to the peer
///
/// Each message is addressed to the connection the dispatcher was serving
/// when it was queued. A connection never writes a message addressed to
/// another one.
#[derive(Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    connection_id: u64,
    text: String,
}

impl OutboundMessage {
    /// Wrap an encoded text frame addressed to `connection_id`
    pub fn new(connection_id: u64, text: impl Into<String>) -> Self {
        Self {
            connection_id,
            text: text.into(),
        }
    }

    /// Connection this message is addressed to
    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    /// Whether this message may be written on `connection_id`
    pub fn is_for(&self, connection_id: u64) -> bool {
        self.connection_id == connection_id
    }

    /// Encoded payload
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Take ownership of the payload for writing
    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Debug for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundMessage")
            .field("connection_id", &self.connection_id)
            .field("len", &self.text.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addressed_to_one_connection() {
        let message = OutboundMessage::new(3, r#"{"type":"ready"}"#);

        assert_eq!(message.connection_id(), 3);
        assert!(message.is_for(3));
        assert!(!message.is_for(4));
        assert_eq!(message.len(), 16);
    }
}
