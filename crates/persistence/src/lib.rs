#![deny(warnings)]

//! Save storage: stamped snapshot documents and pluggable stores.
//!
//! A save is a [`SaveDocument`]: the full player snapshot plus a logical
//! stamp (`seq`) and a wall-clock timestamp. Stores only move whole
//! documents; the session decides when to flush and how to react to
//! failures. [`StaleWriteGuard`] wraps any store and refuses documents
//! stamped older than the newest one it has seen for that key, so a
//! session resumed from an old save cannot clobber newer progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sim_core::PlayerState;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors produced by save stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("stale save for {key}: seq {attempted} is older than {newest}")]
    StaleWrite {
        key: String,
        attempted: u64,
        newest: u64,
    },
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serde(e.to_string())
    }
}

/// One persisted save: the snapshot plus its stamp.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocument {
    /// Logical save stamp. A session resumes it from the loaded document
    /// and increments it on every successful flush, so stamps order saves
    /// by game progress rather than by wall clock.
    pub seq: u64,
    /// Wall-clock time of the flush; epoch milliseconds on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub saved_at: DateTime<Utc>,
    /// The full snapshot.
    pub state: PlayerState,
}

/// Canonical form of a player key: trimmed and lowercased. Stores and the
/// session agree on this form, so "Alice " and "alice" share one save.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A place saves live.
///
/// Implementations replace whole documents per key. Ordering policy lives
/// in [`StaleWriteGuard`], flush scheduling in the session.
pub trait SaveStore {
    /// Loads the stored document for a player key, or None for a new player.
    fn load(&mut self, key: &str) -> Result<Option<SaveDocument>, StoreError>;

    /// Persists a document under a player key, replacing any previous one.
    fn save(&mut self, key: &str, doc: &SaveDocument) -> Result<(), StoreError>;
}

/// In-memory store backing tests and default CLI runs. Documents are held
/// serialized, so a load exercises the same codec path as the file store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saves: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.saves.len()
    }

    /// True while no document has been stored.
    pub fn is_empty(&self) -> bool {
        self.saves.is_empty()
    }
}

impl SaveStore for MemoryStore {
    fn load(&mut self, key: &str) -> Result<Option<SaveDocument>, StoreError> {
        match self.saves.get(&normalize_key(key)) {
            Some(text) => Ok(Some(serde_json::from_str(text)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, key: &str, doc: &SaveDocument) -> Result<(), StoreError> {
        let text = serde_json::to_string(doc)?;
        self.saves.insert(normalize_key(key), text);
        Ok(())
    }
}

/// Normalized key with every character outside [a-z0-9._-] replaced by an
/// underscore, so arbitrary player names map to portable file names.
fn sanitize_key(raw: &str) -> String {
    normalize_key(raw)
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect()
}

/// File-backed store: one pretty-printed `<key>.json` per player under a
/// root directory. Saves stay hand-inspectable and diffable.
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }
}

impl SaveStore for JsonFileStore {
    fn load(&mut self, key: &str) -> Result<Option<SaveDocument>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save(&mut self, key: &str, doc: &SaveDocument) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(doc)?;
        fs::write(self.path_for(key), text)?;
        Ok(())
    }
}

/// Wraps a store and rejects saves stamped older than the newest stamp it
/// has seen for that key. Equal or newer stamps pass through.
///
/// Marks are seeded from loads: a session that loaded seq N may write N or
/// later, while a session still holding an older document may not.
#[derive(Debug)]
pub struct StaleWriteGuard<S> {
    inner: S,
    newest: BTreeMap<String, u64>,
}

impl<S> StaleWriteGuard<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            newest: BTreeMap::new(),
        }
    }

    /// Hands the wrapped store back, dropping the marks.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// The newest stamp seen for a key, if any.
    pub fn newest_seq(&self, key: &str) -> Option<u64> {
        self.newest.get(&normalize_key(key)).copied()
    }

    fn mark(&mut self, key: &str, seq: u64) {
        let entry = self.newest.entry(normalize_key(key)).or_insert(seq);
        if *entry < seq {
            *entry = seq;
        }
    }
}

impl<S: SaveStore> SaveStore for StaleWriteGuard<S> {
    fn load(&mut self, key: &str) -> Result<Option<SaveDocument>, StoreError> {
        let doc = self.inner.load(key)?;
        if let Some(doc) = &doc {
            self.mark(key, doc.seq);
        }
        Ok(doc)
    }

    fn save(&mut self, key: &str, doc: &SaveDocument) -> Result<(), StoreError> {
        let norm = normalize_key(key);
        if let Some(&newest) = self.newest.get(&norm) {
            if doc.seq < newest {
                warn!(
                    "rejecting stale save for {}: seq {} is older than {}",
                    norm, doc.seq, newest
                );
                return Err(StoreError::StaleWrite {
                    key: norm,
                    attempted: doc.seq,
                    newest,
                });
            }
        }
        self.inner.save(key, doc)?;
        self.mark(key, doc.seq);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::{Catalog, Difficulty};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("money-empire-{}-{}", tag, nanos))
    }

    fn doc(seq: u64, money: f64) -> SaveDocument {
        let mut state = Catalog::builtin().new_player("Tester", Difficulty::Easy);
        state.money = money;
        SaveDocument {
            seq,
            saved_at: Utc::now(),
            state,
        }
    }

    #[test]
    fn memory_round_trips_documents() {
        let mut store = MemoryStore::new();
        assert!(store.load("tester").unwrap().is_none());
        store.save("tester", &doc(3, 250.0)).unwrap();
        let loaded = store.load("tester").unwrap().unwrap();
        assert_eq!(loaded.seq, 3);
        assert_eq!(loaded.state.money, 250.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn keys_normalize_across_spellings() {
        let mut store = MemoryStore::new();
        store.save("  Alice ", &doc(1, 100.0)).unwrap();
        assert!(store.load("alice").unwrap().is_some());
        assert!(store.load("ALICE").unwrap().is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn document_wire_shape() {
        let value = serde_json::to_value(doc(3, 100.0)).unwrap();
        assert_eq!(value["seq"], 3);
        assert!(value["savedAt"].is_i64());
        assert_eq!(value["state"]["money"], 100.0);
    }

    #[test]
    fn file_store_round_trips() {
        let dir = scratch_dir("roundtrip");
        let mut store = JsonFileStore::new(&dir).unwrap();
        assert!(store.load("tester").unwrap().is_none());
        store.save("tester", &doc(7, 42.0)).unwrap();
        let loaded = store.load("tester").unwrap().unwrap();
        assert_eq!(loaded.seq, 7);
        assert_eq!(loaded.state.money, 42.0);
        assert!(dir.join("tester.json").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn file_store_sanitizes_keys() {
        let dir = scratch_dir("sanitize");
        let mut store = JsonFileStore::new(&dir).unwrap();
        store.save("Mr. O'Neil!", &doc(1, 10.0)).unwrap();
        assert!(dir.join("mr._o_neil_.json").exists());
        assert!(store.load("Mr. O'Neil!").unwrap().is_some());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_file_reports_serde_error() {
        let dir = scratch_dir("corrupt");
        let mut store = JsonFileStore::new(&dir).unwrap();
        fs::write(dir.join("tester.json"), "not json").unwrap();
        let err = store.load("tester").unwrap_err();
        assert!(matches!(err, StoreError::Serde(_)));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn guard_rejects_older_stamps() {
        let mut guard = StaleWriteGuard::new(MemoryStore::new());
        guard.save("tester", &doc(5, 500.0)).unwrap();
        let err = guard.save("tester", &doc(4, 1.0)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::StaleWrite {
                attempted: 4,
                newest: 5,
                ..
            }
        ));
        // The stored document is untouched by the rejected write.
        assert_eq!(guard.load("tester").unwrap().unwrap().state.money, 500.0);
    }

    #[test]
    fn guard_accepts_equal_and_newer_stamps() {
        let mut guard = StaleWriteGuard::new(MemoryStore::new());
        guard.save("tester", &doc(5, 1.0)).unwrap();
        guard.save("tester", &doc(5, 2.0)).unwrap();
        guard.save("tester", &doc(6, 3.0)).unwrap();
        assert_eq!(guard.newest_seq("tester"), Some(6));
        assert_eq!(guard.load("tester").unwrap().unwrap().state.money, 3.0);
    }

    #[test]
    fn guard_seeds_marks_from_loads() {
        let mut inner = MemoryStore::new();
        inner.save("tester", &doc(7, 700.0)).unwrap();
        let mut guard = StaleWriteGuard::new(inner);
        assert_eq!(guard.newest_seq("tester"), None);
        assert_eq!(guard.load("tester").unwrap().unwrap().seq, 7);
        assert_eq!(guard.newest_seq("tester"), Some(7));
        assert!(guard.save("tester", &doc(3, 1.0)).is_err());
        assert!(guard.save("tester", &doc(8, 2.0)).is_ok());
    }

    #[test]
    fn guard_tracks_keys_independently() {
        let mut guard = StaleWriteGuard::new(MemoryStore::new());
        guard.save("alice", &doc(9, 1.0)).unwrap();
        guard.save("bob", &doc(2, 1.0)).unwrap();
        assert!(guard.save("bob", &doc(3, 1.0)).is_ok());
        assert!(guard.save("alice", &doc(3, 1.0)).is_err());
    }

    proptest! {
        #[test]
        fn sanitized_keys_are_portable(raw in ".{0,40}") {
            let key = sanitize_key(&raw);
            prop_assert!(key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "._-".contains(c)));
            // Sanitizing twice changes nothing.
            prop_assert_eq!(sanitize_key(&key), key.clone());
        }

        #[test]
        fn normalization_is_idempotent(raw in ".{0,40}") {
            let once = normalize_key(&raw);
            prop_assert_eq!(normalize_key(&once), once.clone());
        }
    }
}
