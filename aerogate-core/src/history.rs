//! Result history persisted through a key-value collaborator
//!
//! This belongs to the presentation layer. The gateway never touches it; views
//! use it to keep lists of past results (the regulation library, prior
//! triage runs) across sessions.

use crate::{new_entry_id, EntryId, StorageError, Timestamp};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, RwLock};

/// Key under which the parsed regulation library is stored.
pub const REGULATION_LIBRARY_KEY: &str = "aero_reg_library";

/// Key under which past change-triage results are stored.
pub const TRIAGE_HISTORY_KEY: &str = "aero_triage_history";

/// Byte-oriented key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
}

/// In-process store. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// One recorded value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry<T> {
    pub id: EntryId,
    pub recorded_at: Timestamp,
    pub value: T,
}

/// Bounded, newest-last list of values stored as JSON under a single key.
///
/// Writers going through the same log are serialized. Separate logs over the
/// same store and key are not coordinated with each other.
pub struct HistoryLog<T> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    capacity: usize,
    write_guard: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> HistoryLog<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Capacity is clamped to at least one entry.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, capacity: usize) -> Self {
        Self {
            store,
            key: key.into(),
            capacity: capacity.max(1),
            write_guard: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// All entries, oldest first. A missing key reads as empty.
    pub fn entries(&self) -> Result<Vec<HistoryEntry<T>>, StorageError> {
        match self.store.get(&self.key)? {
            None => Ok(Vec::new()),
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| StorageError::DecodeFailed {
                key: self.key.clone(),
                reason: e.to_string(),
            }),
        }
    }

    /// Record a value, evicting the oldest entries beyond capacity.
    pub fn append(&self, value: T) -> Result<EntryId, StorageError> {
        let _guard = self.write_guard.lock().map_err(|_| StorageError::LockPoisoned)?;
        let mut entries = self.entries()?;
        let id = new_entry_id();
        entries.push(HistoryEntry {
            id,
            recorded_at: Utc::now(),
            value,
        });
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }
        self.write(&entries)?;
        Ok(id)
    }

    /// Most recent value, if any.
    pub fn latest(&self) -> Result<Option<T>, StorageError> {
        Ok(self.entries()?.pop().map(|e| e.value))
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_guard.lock().map_err(|_| StorageError::LockPoisoned)?;
        self.write(&[])
    }

    fn write(&self, entries: &[HistoryEntry<T>]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(entries).map_err(|e| StorageError::EncodeFailed {
            key: self.key.clone(),
            reason: e.to_string(),
        })?;
        self.store.put(&self.key, bytes)
    }
}

impl<T> std::fmt::Debug for HistoryLog<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryLog")
            .field("key", &self.key)
            .field("capacity", &self.capacity)
            .finish()
    }
}
