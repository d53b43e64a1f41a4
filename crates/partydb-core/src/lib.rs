//! # partydb-core
//!
//! Party storage for the character server.
//!
//! Parties live in memory and are mirrored to a flat text file. The owner
//! talks to storage only through the [`PartyDb`] trait, so backends can be
//! swapped without changing the caller.
//!
//! ## Key Concepts
//!
//! - **PartyRecord**: one party with its twelve member slots
//! - **PartyDb**: the storage contract (init, sync, create, remove, save, load, ...)
//! - **CharServerDb**: the owner deciding when changes get synced

pub mod backend;
pub mod config;
pub mod context;
pub mod lock;
pub mod party;
pub mod sync_signal;

// Re-export commonly used types
pub use backend::{PartyDb, PartyDbError, SaveHint};
pub use config::PartyDbConfig;
pub use context::CharServerDb;
pub use party::{PartyDbTxt, PartyId, PartyMember, PartyRecord};
pub use sync_signal::{SyncRequest, SyncSignal};
