//! Party data types.
//!
//! # Data Model Overview
//!
//! A party is a small group of characters sharing experience and loot.
//! Every party carries exactly [`MAX_PARTY`] member slots:
//!
//! ```text
//! PartyRecord
//! ├── id            unique key (0 = not assigned yet)
//! ├── name          at most NAME_LENGTH - 1 bytes
//! ├── share_exp     even experience share on/off
//! ├── share_item    item distribution policy
//! └── members[12]   slot order is meaningful, empty slots stay in place
//! ```
//!
//! Slots are never compacted. Removing a member clears its slot and leaves
//! every other member at the same index.

/// Party identifier.
pub type PartyId = u32;

/// Id value meaning "allocate one for me" when creating a party.
pub const UNASSIGNED_PARTY_ID: PartyId = 0;

/// Largest id a party can have. The watermark must stay above every id,
/// so `PartyId::MAX` itself is never handed out.
pub const MAX_PARTY_ID: PartyId = PartyId::MAX - 1;

/// Number of member slots in every party.
pub const MAX_PARTY: usize = 12;

/// Name buffer size, including the terminator the wire format reserves.
pub const NAME_LENGTH: usize = 24;

/// Longest name a party can actually carry, in bytes.
pub const MAX_NAME_BYTES: usize = NAME_LENGTH - 1;

// ============================================================================
// Members
// ============================================================================

/// A character occupying a party slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartyMember {
    pub account_id: u32,
    pub char_id: u32,
    pub leader: bool,
}

impl PartyMember {
    pub fn new(account_id: u32, char_id: u32) -> Self {
        Self {
            account_id,
            char_id,
            leader: false,
        }
    }

    pub fn leader(account_id: u32, char_id: u32) -> Self {
        Self {
            account_id,
            char_id,
            leader: true,
        }
    }
}

/// One of the fixed member slots of a party.
///
/// A slot is `Empty` only when it would be written as `0,0,0`. Any other
/// triple is kept as `Occupied`, so the slot survives a save/load cycle
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberSlot {
    #[default]
    Empty,
    Occupied(PartyMember),
}

impl MemberSlot {
    /// Build a slot from the three persisted fields.
    pub fn from_parts(account_id: u32, char_id: u32, leader: bool) -> Self {
        if account_id == 0 && char_id == 0 && !leader {
            MemberSlot::Empty
        } else {
            MemberSlot::Occupied(PartyMember {
                account_id,
                char_id,
                leader,
            })
        }
    }

    /// The three persisted fields of this slot.
    pub fn parts(&self) -> (u32, u32, bool) {
        match self {
            MemberSlot::Empty => (0, 0, false),
            MemberSlot::Occupied(m) => (m.account_id, m.char_id, m.leader),
        }
    }

    pub fn member(&self) -> Option<&PartyMember> {
        match self {
            MemberSlot::Empty => None,
            MemberSlot::Occupied(m) => Some(m),
        }
    }

    /// Whether a player is in this slot (`account_id != 0`).
    pub fn is_in_use(&self) -> bool {
        self.member().is_some_and(|m| m.account_id != 0)
    }
}

// ============================================================================
// Party
// ============================================================================

/// One party's persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyRecord {
    /// Unique party id. [`UNASSIGNED_PARTY_ID`] until the store assigns one.
    pub id: PartyId,

    /// User-visible party name.
    pub name: String,

    /// Whether experience is shared evenly.
    pub share_exp: bool,

    /// Item sharing policy as stored by the map server.
    pub share_item: i32,

    /// Member slots in slot order.
    pub members: [MemberSlot; MAX_PARTY],
}

impl PartyRecord {
    /// A new party without an id and with every slot empty.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED_PARTY_ID,
            name: name.into(),
            share_exp: false,
            share_item: 0,
            members: [MemberSlot::Empty; MAX_PARTY],
        }
    }

    /// Same party with an explicit id.
    pub fn with_id(mut self, id: PartyId) -> Self {
        self.id = id;
        self
    }

    /// Number of slots with a player in them.
    pub fn member_count(&self) -> usize {
        self.members.iter().filter(|s| s.is_in_use()).count()
    }

    /// The first member flagged as leader, with its slot index.
    pub fn leader(&self) -> Option<(usize, &PartyMember)> {
        self.members
            .iter()
            .enumerate()
            .find_map(|(i, s)| s.member().filter(|m| m.leader).map(|m| (i, m)))
    }

    /// Slot index of the given character.
    pub fn find_member(&self, account_id: u32, char_id: u32) -> Option<usize> {
        self.members.iter().position(|s| {
            s.member()
                .is_some_and(|m| m.account_id == account_id && m.char_id == char_id)
        })
    }

    /// Index of the first slot nobody occupies.
    pub fn first_free_slot(&self) -> Option<usize> {
        self.members.iter().position(|s| !s.is_in_use())
    }
}

/// Check that a name can be written to a party line.
///
/// Returns a description of the problem, if any.
pub fn name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("name is empty")
    } else if name.len() > MAX_NAME_BYTES {
        Some("name is too long")
    } else if name.contains(&['\t', '\r', '\n'][..]) {
        Some("name contains a tab or line break")
    } else {
        None
    }
}

/// Cut `name` down to at most `max` bytes without splitting a character.
pub fn truncate_name(name: &str, max: usize) -> &str {
    if name.len() <= max {
        return name;
    }
    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod member_slot {
        use super::*;

        #[test]
        fn zero_triple_is_empty() {
            assert_eq!(MemberSlot::from_parts(0, 0, false), MemberSlot::Empty);
        }

        #[test]
        fn partial_triple_is_kept() {
            let slot = MemberSlot::from_parts(0, 7, false);
            assert_eq!(slot.parts(), (0, 7, false));
            assert!(!slot.is_in_use());
        }

        #[test]
        fn occupied_slot_is_in_use() {
            let slot = MemberSlot::Occupied(PartyMember::new(2000001, 150000));
            assert!(slot.is_in_use());
            assert_eq!(slot.parts(), (2000001, 150000, false));
        }
    }

    mod party_record {
        use super::*;

        fn sample() -> PartyRecord {
            let mut party = PartyRecord::new("Crusaders").with_id(3);
            party.members[0] = MemberSlot::Occupied(PartyMember::leader(2000001, 150000));
            party.members[2] = MemberSlot::Occupied(PartyMember::new(2000002, 150001));
            party
        }

        #[test]
        fn new_party_is_unassigned_and_empty() {
            let party = PartyRecord::new("Solo");
            assert_eq!(party.id, UNASSIGNED_PARTY_ID);
            assert_eq!(party.member_count(), 0);
            assert_eq!(party.first_free_slot(), Some(0));
        }

        #[test]
        fn counts_only_used_slots() {
            assert_eq!(sample().member_count(), 2);
        }

        #[test]
        fn finds_leader_and_members() {
            let party = sample();
            let (slot, leader) = party.leader().unwrap();
            assert_eq!(slot, 0);
            assert_eq!(leader.char_id, 150000);
            assert_eq!(party.find_member(2000002, 150001), Some(2));
            assert_eq!(party.find_member(2000002, 1), None);
        }

        #[test]
        fn free_slot_skips_gaps_in_order() {
            assert_eq!(sample().first_free_slot(), Some(1));
        }
    }

    mod names {
        use super::*;

        #[test]
        fn accepts_normal_name() {
            assert_eq!(name_problem("Crusaders"), None);
        }

        #[test]
        fn rejects_unwritable_names() {
            assert!(name_problem("").is_some());
            assert!(name_problem("with\ttab").is_some());
            assert!(name_problem("line\nbreak").is_some());
            assert!(name_problem(&"x".repeat(MAX_NAME_BYTES + 1)).is_some());
            assert!(name_problem(&"x".repeat(MAX_NAME_BYTES)).is_none());
        }

        #[test]
        fn truncates_on_char_boundary() {
            assert_eq!(truncate_name("abcdef", 3), "abc");
            // "é" is two bytes; cutting at 2 would split it
            assert_eq!(truncate_name("aé", 2), "a");
            assert_eq!(truncate_name("short", 23), "short");
        }
    }
}
