//! Single-peer admission
//!
//! The gate holds the connection slot: the ID of the one admitted peer, or
//! nothing. Admission and release each run a caller-supplied hook while the
//! slot lock is held. The listener uses those hooks to post `Connected` and
//! `Disconnected` to the dispatcher, so the two events can never be
//! reordered across a fast reconnect.

use parking_lot::Mutex;

/// Occupancy of the single connection slot
#[derive(Debug, Default)]
pub struct ConnectionGate {
    slot: Mutex<Option<u64>>,
}

impl ConnectionGate {
    /// Create an empty gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `connection_id` if the slot is free
    ///
    /// `on_admit` runs under the slot lock, only when admitted.
    pub fn try_admit(&self, connection_id: u64, on_admit: impl FnOnce()) -> bool {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(connection_id);
        on_admit();
        true
    }

    /// Clear the slot if `connection_id` holds it
    ///
    /// `on_release` runs under the slot lock, after the slot is cleared.
    pub fn release(&self, connection_id: u64, on_release: impl FnOnce()) -> bool {
        let mut slot = self.slot.lock();
        if *slot != Some(connection_id) {
            return false;
        }
        *slot = None;
        on_release();
        true
    }

    /// The admitted connection, if any
    pub fn current(&self) -> Option<u64> {
        *self.slot.lock()
    }

    /// Whether a peer is admitted
    pub fn is_occupied(&self) -> bool {
        self.slot.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_peer_rejected() {
        let gate = ConnectionGate::new();

        assert!(gate.try_admit(1, || {}));
        let mut hook_ran = false;
        assert!(!gate.try_admit(2, || hook_ran = true));

        assert!(!hook_ran);
        assert_eq!(gate.current(), Some(1));
    }

    #[test]
    fn test_release_frees_slot() {
        let gate = ConnectionGate::new();
        gate.try_admit(1, || {});

        let mut released = false;
        assert!(gate.release(1, || released = true));
        assert!(released);
        assert!(!gate.is_occupied());

        assert!(gate.try_admit(2, || {}));
        assert_eq!(gate.current(), Some(2));
    }

    #[test]
    fn test_release_by_other_connection_ignored() {
        let gate = ConnectionGate::new();
        gate.try_admit(1, || {});

        let mut released = false;
        assert!(!gate.release(2, || released = true));
        assert!(!released);
        assert_eq!(gate.current(), Some(1));
    }

    #[test]
    fn test_hooks_observe_slot_state() {
        let gate = ConnectionGate::new();
        let mut order = Vec::new();

        gate.try_admit(1, || order.push("admit"));
        gate.release(1, || order.push("release"));

        assert_eq!(order, vec!["admit", "release"]);
        assert!(!gate.is_occupied());
    }
}
