//! Text-file party backend.
//!
//! Keeps every party in a [`PartyIndex`] and mirrors it to a single text
//! file (see [`codec`](super::codec) for the line format).
//!
//! - `init` rebuilds the index from the file. Lines that fail to decode are
//!   logged and skipped; a missing file is fatal.
//! - Changes only touch memory and ask the owner for a sync.
//! - `sync` rewrites the whole file through a [`LockedFile`].

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::allocator::IdAllocator;
use super::codec::{self, CodecError};
use super::index::PartyIndex;
use super::types::{name_problem, PartyId, PartyRecord, MAX_PARTY_ID, UNASSIGNED_PARTY_ID};
use crate::backend::{PartyDb, PartyDbError, SaveHint};
use crate::config::PartyDbConfig;
use crate::lock::LockedFile;
use crate::sync_signal::SyncRequest;

/// Party storage backed by a flat text file.
pub struct PartyDbTxt {
    owner: Arc<dyn SyncRequest>,
    parties: PartyIndex,
    ids: IdAllocator,
    dirty: bool,
    loaded: bool,

    // settings
    case_sensitive: bool,
    party_file: PathBuf,
}

impl PartyDbTxt {
    pub fn new(config: &PartyDbConfig, owner: Arc<dyn SyncRequest>) -> Self {
        Self {
            owner,
            parties: PartyIndex::new(),
            ids: IdAllocator::new(),
            dirty: false,
            loaded: false,
            case_sensitive: config.case_sensitive,
            party_file: config.party_file.clone(),
        }
    }

    pub fn party_file(&self) -> &Path {
        &self.party_file
    }

    /// The id the next auto-assigned party receives.
    pub fn next_id(&self) -> PartyId {
        self.ids.next_id()
    }

    pub fn len(&self) -> usize {
        self.parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.owner.request_sync();
    }

    fn ensure_loaded(&self) -> Result<(), PartyDbError> {
        if self.loaded {
            Ok(())
        } else {
            Err(PartyDbError::NotLoaded)
        }
    }

    fn check_name(name: &str) -> Result<(), PartyDbError> {
        match name_problem(name) {
            Some(problem) => {
                log::error!("party_db_txt: rejecting party name {name:?}: {problem}");
                Err(PartyDbError::InvalidName(name.to_string()))
            }
            None => Ok(()),
        }
    }

    /// Read the file into the index. Returns the number of skipped lines.
    fn read_file(&mut self) -> Result<usize, PartyDbError> {
        let file = File::open(&self.party_file).map_err(|source| {
            log::error!("Party file not found: {}.", self.party_file.display());
            PartyDbError::FileNotFound {
                path: self.party_file.clone(),
                source,
            }
        })?;

        let mut skipped = 0;
        for (number, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line?;
            let line = match String::from_utf8(line) {
                Ok(line) => line,
                Err(_) => {
                    log::error!(
                        "party_db_txt_init: skipping invalid data on line {}: {}",
                        number + 1,
                        CodecError::InvalidUtf8
                    );
                    skipped += 1;
                    continue;
                }
            };

            if codec::trim_line_end(&line).trim().is_empty() {
                continue;
            }

            if let Some(next_id) = codec::decode_watermark(&line) {
                self.ids.observe_watermark(next_id);
                continue;
            }

            match codec::decode(&line) {
                Ok(party) => {
                    self.ids.observe(party.id);
                    self.parties.put(party.id, party);
                }
                Err(e) => {
                    log::error!(
                        "party_db_txt_init: skipping invalid data on line {}: {} ({})",
                        number + 1,
                        codec::trim_line_end(&line),
                        e
                    );
                    skipped += 1;
                }
            }
        }

        Ok(skipped)
    }

    fn write_file(&self) -> Result<(), PartyDbError> {
        let mut file = LockedFile::open(&self.party_file).map_err(|source| PartyDbError::Lock {
            path: self.party_file.clone(),
            source,
        })?;

        for party in self.parties.iter() {
            writeln!(file, "{}", codec::encode(party))?;
        }
        writeln!(file, "{}", codec::encode_watermark(self.ids.next_id()))?;

        file.commit()?;
        Ok(())
    }
}

impl PartyDb for PartyDbTxt {
    fn init(&mut self) -> Result<(), PartyDbError> {
        self.parties.clear();
        self.ids.reset();
        self.loaded = false;

        match self.read_file() {
            Ok(skipped) => {
                log::info!(
                    "Loaded {} parties from {} (next id {}, {} lines skipped)",
                    self.parties.len(),
                    self.party_file.display(),
                    self.ids.next_id(),
                    skipped
                );
                self.loaded = true;
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.parties.clear();
                self.ids.reset();
                Err(e)
            }
        }
    }

    fn sync(&mut self) -> Result<(), PartyDbError> {
        self.ensure_loaded()?;

        if let Err(e) = self.write_file() {
            log::error!(
                "party_db_txt_sync: can't write [{}] !!! data is lost !!! ({})",
                self.party_file.display(),
                e
            );
            return Err(e);
        }

        log::debug!(
            "Synced {} parties to {}",
            self.parties.len(),
            self.party_file.display()
        );
        self.dirty = false;
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn create(&mut self, party: &mut PartyRecord) -> Result<PartyId, PartyDbError> {
        self.ensure_loaded()?;
        Self::check_name(&party.name)?;

        let id = if party.id == UNASSIGNED_PARTY_ID {
            self.ids.allocate()
        } else {
            party.id
        };

        if id > MAX_PARTY_ID {
            log::error!(
                "party_db_txt_create: cannot create party {}:'{}', id is out of range",
                id,
                party.name
            );
            return Err(PartyDbError::IdOutOfRange(id));
        }

        if let Some(existing) = self.parties.get(id) {
            log::error!(
                "party_db_txt_create: cannot create party {}:'{}', this id is already occupied by {}:'{}'!",
                id,
                party.name,
                id,
                existing.name
            );
            return Err(PartyDbError::Conflict {
                id,
                name: party.name.clone(),
                existing: existing.name.clone(),
            });
        }

        self.parties.put(id, party.clone());
        self.ids.observe(id);
        party.id = id;

        log::debug!("Created party {}:'{}'", id, party.name);
        self.touch();
        Ok(id)
    }

    fn remove(&mut self, id: PartyId) -> Result<(), PartyDbError> {
        self.ensure_loaded()?;

        if self.parties.delete(id).is_some() {
            log::debug!("Removed party {id}");
        }
        self.touch();
        Ok(())
    }

    fn save(&mut self, party: &PartyRecord, hint: SaveHint) -> Result<(), PartyDbError> {
        self.ensure_loaded()?;

        if !self.parties.contains(party.id) {
            return Err(PartyDbError::NotFound(party.id));
        }
        Self::check_name(&party.name)?;

        // Whole records are rewritten regardless of the hint
        log::debug!("Saving party {} ({:?})", party.id, hint);
        self.parties.put(party.id, party.clone());
        self.touch();
        Ok(())
    }

    fn load(&self, id: PartyId) -> Option<PartyRecord> {
        self.parties.get(id).cloned()
    }

    fn name_to_id(&self, name: &str) -> Option<PartyId> {
        self.parties.find_by_name(name, self.case_sensitive)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = PartyRecord> + '_> {
        Box::new(self.parties.iter().cloned())
    }
}

// ============================================================================
// TESTS
// ============================================================================
