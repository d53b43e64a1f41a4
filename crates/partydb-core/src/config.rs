//! Party storage settings.
//!
//! # File Format
//!
//! Optional JSON file, every key may be left out:
//!
//! ```json
//! {
//!   "partyFile": "save/party.txt",
//!   "caseSensitive": false
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default location of the party file.
pub const DEFAULT_PARTY_FILE: &str = "save/party.txt";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for the text-file party backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartyDbConfig {
    /// Backing file of the party store.
    pub party_file: PathBuf,

    /// Compare names case-sensitively in name lookups.
    pub case_sensitive: bool,
}

impl Default for PartyDbConfig {
    fn default() -> Self {
        Self {
            party_file: PathBuf::from(DEFAULT_PARTY_FILE),
            case_sensitive: false,
        }
    }
}

impl PartyDbConfig {
    /// Settings pointing at the given party file.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            party_file: path.into(),
            ..Self::default()
        }
    }

    /// Load settings from a JSON file.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save settings as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_string_pretty(self)?)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }
}
