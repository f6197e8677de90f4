//! Per-player overflow preference.
//!
//! A player who never toggled the feature has it enabled. The first read for
//! such a player persists that default, so the data file lists every player
//! the router has seen.

use overflow_core::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Value used for players with no stored preference.
pub const DEFAULT_ENABLED: bool = true;

/// Errors from a preference store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the data file failed.
    #[error("failed to access preference data: {0}")]
    Io(#[from] std::io::Error),
    /// The data file is not valid JSON.
    #[error("failed to parse preference data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Durable boolean-per-player storage.
pub trait PreferenceStore {
    /// Stored value, if any.
    fn get(&self, player: PlayerId) -> Option<bool>;

    /// Store a value. Implementations persist before returning.
    fn set(&mut self, player: PlayerId, enabled: bool) -> Result<(), StoreError>;
}

/// Volatile store, used by tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: HashMap<PlayerId, bool>,
}

impl MemoryPreferenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of players with a stored value.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no player has a stored value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, player: PlayerId) -> Option<bool> {
        self.values.get(&player).copied()
    }

    fn set(&mut self, player: PlayerId, enabled: bool) -> Result<(), StoreError> {
        self.values.insert(player, enabled);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredPreferences {
    #[serde(default)]
    overflow_enabled: BTreeMap<u64, bool>,
}

/// JSON-file store, rewritten synchronously on every `set`.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    data: StoredPreferences,
}

impl JsonPreferenceStore {
    /// Open the store at `path`, starting empty when the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoredPreferences::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, data })
    }

    /// Location of the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, player: PlayerId) -> Option<bool> {
        self.data.overflow_enabled.get(&player.0).copied()
    }

    fn set(&mut self, player: PlayerId, enabled: bool) -> Result<(), StoreError> {
        self.data.overflow_enabled.insert(player.0, enabled);
        self.save()
    }
}

/// Read/toggle facade over a [`PreferenceStore`].
#[derive(Debug)]
pub struct Preferences<S> {
    store: S,
}

impl<S: PreferenceStore> Preferences<S> {
    /// Wrap a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Whether overflow routing is enabled for `player`.
    ///
    /// Writes [`DEFAULT_ENABLED`] on the first read for a player. A failed
    /// write is logged and the default is still returned.
    pub fn enabled_for(&mut self, player: PlayerId) -> bool {
        if let Some(enabled) = self.store.get(player) {
            return enabled;
        }
        if let Err(err) = self.store.set(player, DEFAULT_ENABLED) {
            warn!(%player, "failed to persist default overflow preference: {err}");
        }
        DEFAULT_ENABLED
    }

    /// Flip the preference and return the new value.
    pub fn toggle(&mut self, player: PlayerId) -> Result<bool, StoreError> {
        let enabled = !self.enabled_for(player);
        self.store.set(player, enabled)?;
        Ok(enabled)
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
