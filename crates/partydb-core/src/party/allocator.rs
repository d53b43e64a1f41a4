//! Auto-increment party ids.

use super::types::PartyId;

/// First id handed out on an empty store.
pub const START_PARTY_ID: PartyId = 1;

/// Tracks the next unassigned party id.
///
/// `next_id` stays strictly above every id observed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdAllocator {
    next_id: PartyId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::starting_at(START_PARTY_ID)
    }

    pub fn starting_at(next_id: PartyId) -> Self {
        Self { next_id }
    }

    /// The id the next auto-assigned party receives.
    pub fn next_id(&self) -> PartyId {
        self.next_id
    }

    /// Id to use for a party created without one.
    ///
    /// Does not advance the watermark; call [`observe`](Self::observe)
    /// once the id is actually used.
    pub fn allocate(&self) -> PartyId {
        self.next_id
    }

    /// Record that `id` is in use.
    pub fn observe(&mut self, id: PartyId) {
        if id >= self.next_id {
            self.next_id = id.saturating_add(1);
        }
    }

    /// Apply a persisted watermark, which already names the next free id.
    pub fn observe_watermark(&mut self, next_id: PartyId) {
        if next_id > self.next_id {
            self.next_id = next_id;
        }
    }

    pub fn reset(&mut self) {
        self.next_id = START_PARTY_ID;
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one() {
        assert_eq!(IdAllocator::new().allocate(), 1);
    }

    #[test]
    fn observe_moves_past_id() {
        let mut ids = IdAllocator::new();
        ids.observe(5);
        assert_eq!(ids.next_id(), 6);
        ids.observe(3);
        assert_eq!(ids.next_id(), 6);
        ids.observe(6);
        assert_eq!(ids.next_id(), 7);
    }

    #[test]
    fn allocate_does_not_advance() {
        let ids = IdAllocator::new();
        assert_eq!(ids.allocate(), ids.allocate());
    }

    #[test]
    fn watermark_is_taken_as_is() {
        let mut ids = IdAllocator::new();
        ids.observe_watermark(10);
        assert_eq!(ids.next_id(), 10);
        ids.observe_watermark(4);
        assert_eq!(ids.next_id(), 10);
    }

    #[test]
    fn reset_returns_to_start() {
        let mut ids = IdAllocator::starting_at(50);
        ids.reset();
        assert_eq!(ids.next_id(), START_PARTY_ID);
    }
}
