//! Result cache for completed analyses
//!
//! Records are kept most-recent-first and capped; the oldest entries are
//! evicted on overflow. Every mutation writes the full snapshot back through
//! a [`HistoryPort`]. Load and save failures never reach the caller: a
//! missing, corrupt or wrong-version snapshot loads as an empty history and
//! failed writes are only logged.

use crate::error::PersistenceError;
use crate::response::AnalysisResult;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Snapshot format version written by this build
pub(crate) const SNAPSHOT_VERSION: u32 = 1;

/// One persisted analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptRecord {
    pub(crate) id: String,
    pub(crate) original_prompt: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) analysis: Option<AnalysisResult>,
}

impl PromptRecord {
    /// New record with a placeholder id; the cache assigns the real one
    pub(crate) fn new(original_prompt: impl Into<String>, analysis: AnalysisResult) -> Self {
        Self {
            id: String::new(),
            original_prompt: original_prompt.into(),
            created_at: Utc::now(),
            analysis: Some(analysis),
        }
    }
}

/// Serialized form of the whole cache
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    records: Vec<PromptRecord>,
}

/// Load/save abstraction over wherever the snapshot lives
pub(crate) trait HistoryPort: Send + Sync {
    /// Raw snapshot, or `None` if nothing has been stored
    fn load(&self) -> Result<Option<String>, PersistenceError>;
    fn save(&self, snapshot: &str) -> Result<(), PersistenceError>;
    /// Remove the stored snapshot entirely
    fn remove(&self) -> Result<(), PersistenceError>;
}

/// Snapshot stored as a JSON file
pub(crate) struct FileHistoryPort {
    path: PathBuf,
}

impl FileHistoryPort {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File in the user's data directory
    pub(crate) fn default_location() -> Result<Self, PersistenceError> {
        let path = default_history_path().ok_or(PersistenceError::NoDataDir)?;
        Ok(Self::new(path))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

/// Default history file path
pub(crate) fn default_history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("ForgeIQ").join("history.json"))
}

impl HistoryPort for FileHistoryPort {
    fn load(&self) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snapshot: &str) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                info!("Created history directory: {:?}", parent);
            }
        }

        // Write-then-rename so a crash never leaves a half-written snapshot
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, snapshot)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Snapshot held in memory (`--ephemeral` sessions and tests)
#[derive(Clone, Default)]
pub(crate) struct MemoryHistoryPort {
    snapshot: Arc<Mutex<Option<String>>>,
}

impl MemoryHistoryPort {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Port pre-loaded with a raw snapshot
    #[cfg(test)]
    pub(crate) fn with_snapshot(snapshot: &str) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(Some(snapshot.to_string()))),
        }
    }

    /// Currently stored snapshot
    #[cfg(test)]
    pub(crate) fn stored(&self) -> Option<String> {
        self.snapshot.lock().ok().and_then(|s| s.clone())
    }
}

impl HistoryPort for MemoryHistoryPort {
    fn load(&self) -> Result<Option<String>, PersistenceError> {
        Ok(self
            .snapshot
            .lock()
            .map_err(|_| std::io::Error::other("history lock poisoned"))?
            .clone())
    }

    fn save(&self, snapshot: &str) -> Result<(), PersistenceError> {
        *self
            .snapshot
            .lock()
            .map_err(|_| std::io::Error::other("history lock poisoned"))? = Some(snapshot.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), PersistenceError> {
        *self
            .snapshot
            .lock()
            .map_err(|_| std::io::Error::other("history lock poisoned"))? = None;
        Ok(())
    }
}

/// Capped, most-recent-first history of analyses
pub(crate) struct HistoryStore {
    port: Box<dyn HistoryPort>,
    records: Vec<PromptRecord>,
    max_entries: usize,
}

impl HistoryStore {
    /// Open the store and load whatever snapshot the port holds
    pub(crate) fn open(port: Box<dyn HistoryPort>, max_entries: usize) -> Self {
        let mut store = Self {
            port,
            records: Vec::new(),
            max_entries: max_entries.max(1),
        };
        store.records = store.load();
        // A snapshot written under a larger cap is trimmed on load
        store.records.truncate(store.max_entries);
        store
    }

    /// Read the persisted snapshot; never fails
    pub(crate) fn load(&self) -> Vec<PromptRecord> {
        match self.try_load() {
            Ok(records) => records,
            Err(e) => {
                warn!("Discarding unreadable history snapshot: {}", e);
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<Vec<PromptRecord>, PersistenceError> {
        let Some(raw) = self.port.load()? else {
            return Ok(Vec::new());
        };
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot.records)
    }

    /// Insert at the front, evicting the oldest entries past the cap
    ///
    /// The record gets a fresh id unique within the cache. Returns the id.
    pub(crate) fn append(&mut self, mut record: PromptRecord) -> String {
        record.id = self.unique_id();
        let id = record.id.clone();

        self.records.insert(0, record);
        if self.records.len() > self.max_entries {
            let evicted = self.records.len() - self.max_entries;
            self.records.truncate(self.max_entries);
            debug!(evicted, "Evicted oldest history entries");
        }

        self.persist();
        id
    }

    /// Delete a record; no-op if absent. Returns whether something was removed.
    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        let removed = self.records.len() != before;
        self.persist();
        removed
    }

    /// Drop every record and the persisted snapshot
    pub(crate) fn clear(&mut self) {
        self.records.clear();
        if let Err(e) = self.port.remove() {
            warn!("Failed to remove history snapshot: {}", e);
        }
    }

    pub(crate) fn get(&self, id: &str) -> Option<&PromptRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub(crate) fn records(&self) -> &[PromptRecord] {
        &self.records
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the full snapshot; failures are logged, not returned
    fn persist(&self) {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            records: self.records.clone(),
        };
        let result = serde_json::to_string(&snapshot)
            .map_err(PersistenceError::from)
            .and_then(|json| self.port.save(&json));
        if let Err(e) = result {
            warn!("Failed to persist history: {}", e);
        }
    }

    fn unique_id(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let id = format!(
                "{:x}-{:08x}",
                Utc::now().timestamp_millis(),
                rng.gen::<u32>()
            );
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}
