//! Party storage.
//!
//! # Overview
//!
//! - **types** - `PartyRecord` and its fixed member slots
//! - **codec** - one party per line of tab-separated text
//! - **index** - in-memory parties keyed by id
//! - **allocator** - next free party id
//! - **txt** - the text-file backend tying the above together
//!
//! # File Location
//!
//! ```text
//! save/
//! ├── party.txt        # one line per party + `<next_id>\t%newid%`
//! ├── party.txt.lock   # lock file, held by the writer during a sync
//! └── party.txt.tmp    # staging file, only present during a sync
//! ```

pub mod allocator;
pub mod codec;
pub mod index;
pub mod txt;
pub mod types;

pub use allocator::{IdAllocator, START_PARTY_ID};
pub use codec::{decode, decode_watermark, encode, encode_watermark, CodecError};
pub use index::PartyIndex;
pub use txt::PartyDbTxt;
pub use types::*;
