//! Debounced per-field persistence.
//!
//! Every edit schedules a save and supersedes any pending save for the same
//! field. The runtime delivers timer expiry as a message carrying the token
//! that was current when the edit happened; a fired timer whose token is no
//! longer current is simply discarded, so a stale write can never be issued
//! after a newer edit.

use super::SlotKey;
use std::collections::HashMap;
use std::time::Duration;

/// Delay between the last keystroke and the remote save.
pub const AUTOSAVE_DELAY: Duration = Duration::from_millis(500);

/// Identifies one scheduled save. Monotonic per queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveToken(u64);

#[derive(Debug, Clone)]
struct PendingSave {
    token: SaveToken,
    value: String,
}

/// Coalesces rapid edits into a single remote write per field.
#[derive(Debug, Default, Clone)]
pub struct AutosaveQueue {
    pending: HashMap<SlotKey, PendingSave>,
    next_token: u64,
}

impl AutosaveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest value for a field and return the token its timer
    /// must present on expiry. Any previously scheduled save for the same
    /// field is superseded.
    pub fn schedule(&mut self, slot: SlotKey, value: String) -> SaveToken {
        self.next_token += 1;
        let token = SaveToken(self.next_token);
        self.pending.insert(slot, PendingSave { token, value });
        token
    }

    /// Consume the pending value if `token` is still the newest one for the
    /// field. A stale token leaves the newer pending save untouched and
    /// yields nothing.
    pub fn take_if_current(&mut self, slot: &SlotKey, token: SaveToken) -> Option<String> {
        match self.pending.get(slot) {
            Some(p) if p.token == token => self.pending.remove(slot).map(|p| p.value),
            _ => None,
        }
    }

    /// Drop any pending save for the field without sending it.
    pub fn cancel(&mut self, slot: &SlotKey) {
        self.pending.remove(slot);
    }

    /// Number of fields with a save still waiting on its timer.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(q: &str) -> SlotKey {
        SlotKey::new("Finans", q)
    }

    #[test]
    fn rapid_edits_coalesce_to_last_value() {
        let mut queue = AutosaveQueue::new();
        let first = queue.schedule(slot("currency_info"), "1".into());
        let second = queue.schedule(slot("currency_info"), "12".into());
        let third = queue.schedule(slot("currency_info"), "123".into());

        // The first two timers fire stale and send nothing.
        assert_eq!(queue.take_if_current(&slot("currency_info"), first), None);
        assert_eq!(queue.take_if_current(&slot("currency_info"), second), None);

        // Only the newest fires, with the final value.
        assert_eq!(
            queue.take_if_current(&slot("currency_info"), third),
            Some("123".into())
        );
        assert_eq!(queue.pending_count(), 0);

        // A token never fires twice.
        assert_eq!(queue.take_if_current(&slot("currency_info"), third), None);
    }

    #[test]
    fn fields_are_independent() {
        let mut queue = AutosaveQueue::new();
        let a = queue.schedule(slot("currency_info"), "a".into());
        let b = queue.schedule(slot("investment_return"), "b".into());

        assert_eq!(
            queue.take_if_current(&slot("investment_return"), b),
            Some("b".into())
        );
        assert_eq!(
            queue.take_if_current(&slot("currency_info"), a),
            Some("a".into())
        );
    }

    #[test]
    fn stale_token_leaves_newer_save_pending() {
        let mut queue = AutosaveQueue::new();
        let old = queue.schedule(slot("currency_info"), "old".into());
        let new = queue.schedule(slot("currency_info"), "new".into());

        assert_eq!(queue.take_if_current(&slot("currency_info"), old), None);
        assert_eq!(queue.pending_count(), 1);
        assert_eq!(
            queue.take_if_current(&slot("currency_info"), new),
            Some("new".into())
        );
    }

    #[test]
    fn cancel_discards_pending_save() {
        let mut queue = AutosaveQueue::new();
        let token = queue.schedule(slot("finance_details"), "draft".into());
        queue.cancel(&slot("finance_details"));
        assert_eq!(queue.take_if_current(&slot("finance_details"), token), None);
    }
}
