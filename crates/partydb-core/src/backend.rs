//! The storage contract every party backend implements.
//!
//! The owner only ever holds a `Box<dyn PartyDb>`, so a text-file store and
//! any other backend can be swapped without touching the caller.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::party::{PartyId, PartyRecord};

/// Errors returned by party backends.
#[derive(Error, Debug)]
pub enum PartyDbError {
    #[error("Party file not found: {}", .path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Can't lock {} for writing: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Party id {id} for '{name}' is already taken by '{existing}'")]
    Conflict {
        id: PartyId,
        name: String,
        existing: String,
    },

    #[error("Party id {0} is out of range (ids run from 1 to {max})", max = crate::party::MAX_PARTY_ID)]
    IdOutOfRange(PartyId),

    #[error("Party not found: {0}")]
    NotFound(PartyId),

    #[error("Invalid party name {0:?}")]
    InvalidName(String),

    #[error("Party storage is not loaded")]
    NotLoaded,
}

/// What part of a party a save touches.
///
/// Backends that write partial updates use this to limit the write.
/// Backends that rewrite whole records may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveHint {
    /// Name and share settings.
    Basic,
    /// Leader flags.
    Leader,
    /// A member joined the given slot.
    AddMember(usize),
    /// A member left the given slot.
    RemoveMember(usize),
    /// Everything.
    Full,
}

/// Party storage.
///
/// Mutating calls notify the owner that a sync is due; they never write
/// to disk themselves. Records go in and come out as copies.
pub trait PartyDb: Send {
    /// Load all parties from backing storage, replacing what is in memory.
    fn init(&mut self) -> Result<(), PartyDbError>;

    /// Write every party to backing storage.
    fn sync(&mut self) -> Result<(), PartyDbError>;

    /// Whether there are changes not yet synced.
    fn is_dirty(&self) -> bool;

    /// Store a new party.
    ///
    /// An id of [`UNASSIGNED_PARTY_ID`](crate::party::UNASSIGNED_PARTY_ID)
    /// gets a fresh one, which is written back into `party`.
    fn create(&mut self, party: &mut PartyRecord) -> Result<PartyId, PartyDbError>;

    /// Delete a party. Deleting a missing id succeeds.
    fn remove(&mut self, id: PartyId) -> Result<(), PartyDbError>;

    /// Overwrite an existing party. Never creates one.
    fn save(&mut self, party: &PartyRecord, hint: SaveHint) -> Result<(), PartyDbError>;

    /// Copy of the party with the given id.
    fn load(&self, id: PartyId) -> Option<PartyRecord>;

    /// Id of the first party with the given name.
    fn name_to_id(&self, name: &str) -> Option<PartyId>;

    /// All parties, as of the time of the call.
    fn iter(&self) -> Box<dyn Iterator<Item = PartyRecord> + '_>;
}
