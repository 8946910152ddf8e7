//! Thread-safe FIFO of pending outbound messages
//!
//! The queue decouples producers (the dispatcher thread, pipeline callbacks)
//! from the single consumer that owns the socket. It is unbounded: a slow
//! peer accumulates messages rather than stalling a producer.
//!
//! Every push signals the consumer through a [`Notify`]. Notifications
//! coalesce into a single stored permit, so several pushes before a drain
//! produce one wake-up, and a push onto an empty queue always produces at
//! least one.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::message::OutboundMessage;

/// Ordered, lock-protected outbound queue
#[derive(Debug, Default)]
pub struct OutboundQueue {
    items: Mutex<VecDeque<OutboundMessage>>,
    writable: Notify,
}

impl OutboundQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the tail and wake the consumer
    ///
    /// Never blocks on I/O and never fails.
    pub fn push(&self, message: OutboundMessage) {
        self.items.lock().push_back(message);
        self.writable.notify_one();
    }

    /// Remove and return the head, or `None` when empty
    pub fn drain_one(&self) -> Option<OutboundMessage> {
        self.items.lock().pop_front()
    }

    /// Detach every pending message at once
    ///
    /// The returned messages are for disposal; they are never delivered.
    pub fn drain_all(&self) -> VecDeque<OutboundMessage> {
        std::mem::take(&mut *self.items.lock())
    }

    /// Number of pending messages
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Wait until a push (or [`rearm`](Self::rearm)) signals writable work
    pub async fn writable(&self) {
        self.writable.notified().await;
    }

    /// Request another writable wake-up without pushing
    ///
    /// Used by the consumer after writing one message while more remain.
    pub fn rearm(&self) {
        self.writable.notify_one();
    }
}
