use crate::error::Result;
use crate::types::SaveStatus;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

// ---------------------------------------------------------------------------
// Store keys
// ---------------------------------------------------------------------------

/// The fixed keys the core persists under. A store is a flat map from these
/// keys to JSON values; no multi-key transaction is ever assumed.
pub mod keys {
    pub const TASKS: &str = "tasks";
    pub const SLOTS: &str = "slots";
    pub const SLOT_NOTES: &str = "slot-notes";
    /// Pre-note-list shape: one plain string per slot. Read-only fallback.
    pub const SLOT_NOTE_TEXTS: &str = "slot-note-texts";
    pub const PROJECTS: &str = "projects";
    pub const FOOTSTONES: &str = "footstones";
    pub const STARTED: &str = "started";
    pub const PLAN_VIDEOS: &str = "plan-videos";
    pub const ACTIVE_FOCUS: &str = "active-focus";
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Durable key→JSON mapping. Each call is independent and best-effort; the
/// projections layered on top keep their in-memory state authoritative when a
/// write fails.
pub trait Store {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&mut self, key: &str, value: Value) -> Result<()>;
}

/// Serialize and write, degrading failure to [`SaveStatus::NotSaved`]. This is
/// the single funnel every projection persists through.
pub fn write_json<T: Serialize>(store: &mut dyn Store, key: &str, value: &T) -> SaveStatus {
    let value = match serde_json::to_value(value) {
        Ok(v) => v,
        Err(error) => {
            warn!(key, %error, "could not serialize for store write");
            return SaveStatus::NotSaved;
        }
    };
    match store.set(key, value) {
        Ok(()) => SaveStatus::Saved,
        Err(error) => {
            warn!(key, %error, "store write failed; keeping in-memory state");
            SaveStatus::NotSaved
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// One `<key>.json` file per key under a root directory, written atomically so
/// a crash mid-write never corrupts an entry.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let data = std::fs::read_to_string(self.entry_path(key)).ok()?;
        serde_json::from_str(&data).ok()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        atomic_write(
            &self.entry_path(key),
            serde_json::to_string_pretty(&value)?.as_bytes(),
        )
    }
}

/// Write via a tempfile in the target directory and rename into place.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
