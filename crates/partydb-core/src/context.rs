//! CharServerDb - the owner of party storage.
//!
//! The character server holds its party backend only through the
//! [`PartyDb`] trait and decides when changes reach disk:
//!
//! ```text
//!              ┌──────────────────────────┐
//!              │       CharServerDb       │
//!              ├──────────────────────────┤
//!              │  - Box<dyn PartyDb>      │──── create/save/remove
//!              │  - Arc<SyncSignal>       │◄─── request_sync()
//!              └────────────┬─────────────┘
//!                           │ flush_if_requested()
//!                           ▼
//!                      PartyDb::sync()
//! ```

use std::sync::Arc;

use crate::backend::{PartyDb, PartyDbError};
use crate::config::PartyDbConfig;
use crate::party::PartyDbTxt;
use crate::sync_signal::SyncSignal;

/// Configuration for building a CharServerDb.
#[derive(Default)]
pub struct CharServerDbBuilder {
    config: Option<PartyDbConfig>,
    sync_signal: Option<Arc<SyncSignal>>,
    parties: Option<Box<dyn PartyDb>>,
}

impl CharServerDbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for the default text-file backend.
    pub fn config(mut self, config: PartyDbConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an existing SyncSignal (for testing or sharing with other stores).
    pub fn sync_signal(mut self, signal: Arc<SyncSignal>) -> Self {
        self.sync_signal = Some(signal);
        self
    }

    /// Use another party backend instead of the text file.
    ///
    /// The backend should report to the same signal passed to
    /// [`sync_signal`](Self::sync_signal).
    pub fn parties(mut self, parties: Box<dyn PartyDb>) -> Self {
        self.parties = Some(parties);
        self
    }

    pub fn build(self) -> CharServerDb {
        let sync_signal = self
            .sync_signal
            .unwrap_or_else(|| Arc::new(SyncSignal::new()));
        let parties: Box<dyn PartyDb> = match self.parties {
            Some(parties) => parties,
            None => {
                let config = self.config.unwrap_or_default();
                Box::new(PartyDbTxt::new(&config, sync_signal.clone()))
            }
        };

        CharServerDb {
            parties,
            sync_signal,
        }
    }
}

/// Owner of the character server's party storage.
pub struct CharServerDb {
    parties: Box<dyn PartyDb>,
    sync_signal: Arc<SyncSignal>,
}

impl CharServerDb {
    pub fn builder() -> CharServerDbBuilder {
        CharServerDbBuilder::new()
    }

    /// Load all storage. A failure here leaves the server unusable.
    pub fn init(&mut self) -> Result<(), PartyDbError> {
        self.parties.init()?;
        // Loading is not a change
        self.sync_signal.take();
        Ok(())
    }

    pub fn parties(&self) -> &dyn PartyDb {
        self.parties.as_ref()
    }

    pub fn parties_mut(&mut self) -> &mut dyn PartyDb {
        self.parties.as_mut()
    }

    pub fn sync_signal(&self) -> &Arc<SyncSignal> {
        &self.sync_signal
    }

    /// Sync if any store asked for it since the last flush.
    ///
    /// Returns whether a sync ran. A failed sync re-arms the request so the
    /// next call tries again.
    pub fn flush_if_requested(&mut self) -> Result<bool, PartyDbError> {
        if !self.sync_signal.take() {
            return Ok(false);
        }

        if let Err(e) = self.parties.sync() {
            self.sync_signal.request_again();
            return Err(e);
        }
        Ok(true)
    }

    /// Sync unconditionally.
    pub fn sync_all(&mut self) -> Result<(), PartyDbError> {
        self.sync_signal.take();
        if let Err(e) = self.parties.sync() {
            self.sync_signal.request_again();
            return Err(e);
        }
        Ok(())
    }
}

impl Drop for CharServerDb {
    fn drop(&mut self) {
        if self.parties.is_dirty() {
            log::warn!("Party storage dropped with unsynced changes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::party::{PartyRecord, UNASSIGNED_PARTY_ID};
    use crate::sync_signal::SyncRequest;
    use std::fs;
    use tempfile::tempdir;

    fn server_in(dir: &std::path::Path) -> CharServerDb {
        let path = dir.join("party.txt");
        fs::write(&path, "").unwrap();
        let mut server = CharServerDb::builder()
            .config(PartyDbConfig::with_file(path))
            .build();
        server.init().unwrap();
        server
    }

    #[test]
    fn builder_uses_provided_signal() {
        let signal = Arc::new(SyncSignal::new());
        let server = CharServerDb::builder()
            .sync_signal(Arc::clone(&signal))
            .build();

        assert!(Arc::ptr_eq(server.sync_signal(), &signal));
    }

    #[test]
    fn init_fails_without_party_file() {
        let dir = tempdir().unwrap();
        let mut server = CharServerDb::builder()
            .config(PartyDbConfig::with_file(dir.path().join("missing.txt")))
            .build();

        assert!(matches!(
            server.init(),
            Err(PartyDbError::FileNotFound { .. })
        ));
    }

    #[test]
    fn nothing_to_flush_after_init() {
        let dir = tempdir().unwrap();
        let mut server = server_in(dir.path());

        assert!(!server.flush_if_requested().unwrap());
    }

    #[test]
    fn create_requests_flush() {
        let dir = tempdir().unwrap();
        let mut server = server_in(dir.path());

        let mut party = PartyRecord::new("Alpha");
        assert_eq!(party.id, UNASSIGNED_PARTY_ID);
        server.parties_mut().create(&mut party).unwrap();

        assert!(server.flush_if_requested().unwrap());
        assert!(!server.parties().is_dirty());
        assert!(!server.flush_if_requested().unwrap());

        let contents = fs::read_to_string(dir.path().join("party.txt")).unwrap();
        assert!(contents.starts_with("1\tAlpha\t"));
    }

    #[test]
    fn failed_flush_is_retried() {
        let dir = tempdir().unwrap();
        let mut server = server_in(dir.path());
        server
            .parties_mut()
            .create(&mut PartyRecord::new("Alpha"))
            .unwrap();

        let held = crate::lock::LockedFile::open(&dir.path().join("party.txt")).unwrap();
        assert!(server.flush_if_requested().is_err());
        assert!(server.sync_signal().is_pending());

        drop(held);
        assert!(server.flush_if_requested().unwrap());
    }

    #[test]
    fn external_requests_trigger_flush() {
        let dir = tempdir().unwrap();
        let mut server = server_in(dir.path());

        server.sync_signal().request_sync();
        assert!(server.flush_if_requested().unwrap());
        assert!(dir.path().join("party.txt").exists());
    }

    #[test]
    fn sync_all_writes_without_request() {
        let dir = tempdir().unwrap();
        let mut server = server_in(dir.path());

        server.sync_all().unwrap();
        let contents = fs::read_to_string(dir.path().join("party.txt")).unwrap();
        assert_eq!(contents, "1\t%newid%\n");
    }
}
