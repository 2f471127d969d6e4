//! Progress persistence over a client-side key-value store.
//!
//! Storage failures never reach the caller: reads degrade to "nothing
//! stored" and writes are logged and dropped.

use crate::error::StorageError;
use crate::index::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use ts_rs::TS;

/// Synchronous string key-value storage, last write wins.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProgressSnapshot {
    pub current_group_key: String,
    pub current_section_id: String,
    /// Global position under narration when the snapshot was taken.
    pub voice_cursor: Option<usize>,
    pub session_started: bool,
    /// Unix milliseconds.
    #[ts(type = "number")]
    pub timestamp: u64,
}

impl ProgressSnapshot {
    pub fn position(&self) -> Position {
        Position::new(&self.current_group_key, &self.current_section_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CompletionRecord {
    #[ts(type = "number")]
    pub completed_at: u64,
}

pub struct ProgressStore<S> {
    storage: S,
    key: String,
    completion_key: String,
    session_started: bool,
    saves: usize,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(storage: S, key: impl Into<String>, completion_key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            completion_key: completion_key.into(),
            session_started: false,
            saves: 0,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn is_started(&self) -> bool {
        self.session_started
    }

    /// Whether a save succeeded since the last clear.
    pub fn has_saved(&self) -> bool {
        self.saves > 0
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }

    /// Overwrite the stored snapshot. Returns whether the write succeeded.
    pub fn save(&mut self, snapshot: &ProgressSnapshot) -> bool {
        let encoded = match serde_json::to_string(snapshot) {
            Ok(encoded) => encoded,
            Err(source) => {
                let err = StorageError::Encode {
                    key: self.key.clone(),
                    source,
                };
                warn!("Failed to encode progress snapshot: {err}");
                return false;
            }
        };
        match self.storage.set(&self.key, &encoded) {
            Ok(()) => {
                self.saves += 1;
                debug!(
                    key = %self.key,
                    group = %snapshot.current_group_key,
                    section = %snapshot.current_section_id,
                    "Saved progress snapshot"
                );
                true
            }
            Err(err) => {
                warn!("Failed to save progress snapshot: {err}");
                false
            }
        }
    }

    pub fn load(&self) -> Option<ProgressSnapshot> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!("Failed to read progress snapshot: {err}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(key = %self.key, "Ignoring malformed progress snapshot: {err}");
                None
            }
        }
    }

    /// Remove the stored snapshot and forget that the session started.
    pub fn clear(&mut self) {
        if let Err(err) = self.storage.remove(&self.key) {
            warn!("Failed to clear progress snapshot: {err}");
        }
        self.session_started = false;
        self.saves = 0;
        info!(key = %self.key, "Cleared reading progress");
    }

    /// Flag the session as started; the first call saves immediately.
    /// Returns `true` only for that first call.
    pub fn mark_started(&mut self, snapshot: ProgressSnapshot) -> bool {
        if self.session_started {
            return false;
        }
        self.session_started = true;
        info!("Reading session started");
        self.save(&ProgressSnapshot {
            session_started: true,
            ..snapshot
        });
        true
    }

    pub fn record_completion(&mut self, completed_at: u64) {
        let record = CompletionRecord { completed_at };
        let encoded = match serde_json::to_string(&record) {
            Ok(encoded) => encoded,
            Err(source) => {
                let err = StorageError::Encode {
                    key: self.completion_key.clone(),
                    source,
                };
                warn!("Failed to encode completion record: {err}");
                return;
            }
        };
        match self.storage.set(&self.completion_key, &encoded) {
            Ok(()) => info!(completed_at, "Recorded contract completion"),
            Err(err) => warn!("Failed to record completion: {err}"),
        }
    }

    pub fn completion(&self) -> Option<CompletionRecord> {
        let raw = self.storage.get(&self.completion_key).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }
}
