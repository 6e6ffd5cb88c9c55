//! Single-file, versioned snapshot of a [`ContentStore`].
//!
//! The file is a JSON document:
//!
//! ```json
//! {
//!   "format": "ragstore-snapshot",
//!   "version": 1,
//!   "saved_at": "2024-01-01T00:00:00Z",
//!   "records": [{"id": "doc_1", "content_hash": "…", "text": "…", "embedding": [0.1, …]}],
//!   "hash_index": [["…", "doc_1"]]
//! }
//! ```
//!
//! `records` and `hash_index` are both in insertion order. The record map and
//! the hash index live in the same file and are replaced by one rename, so a
//! crash mid-save leaves either the old snapshot or the new one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{RagError, Result};

use super::{ContentStore, Record};

pub const SNAPSHOT_FORMAT: &str = "ragstore-snapshot";
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotOut<'a> {
    format: &'static str,
    version: u32,
    saved_at: DateTime<Utc>,
    records: Vec<&'a Record>,
    hash_index: Vec<(&'a str, &'a str)>,
}

#[derive(Deserialize)]
struct SnapshotIn {
    format: String,
    version: u32,
    saved_at: DateTime<Utc>,
    records: Vec<Record>,
    hash_index: Vec<(String, String)>,
}

/// A store read back from disk.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub store: ContentStore,
    pub saved_at: DateTime<Utc>,
}

/// Write `store` to `path`, replacing any previous snapshot atomically.
///
/// JSON has no encoding for NaN or infinity, so a store holding a non-finite
/// embedding value is refused before anything is written.
pub fn save(store: &ContentStore, path: &Path) -> Result<DateTime<Utc>> {
    if let Some(record) = store
        .records()
        .find(|r| r.embedding.iter().any(|x| !x.is_finite()))
    {
        return Err(RagError::invalid(format!(
            "{} has a non-finite embedding value and cannot be saved",
            record.id
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let saved_at = Utc::now();
    let snapshot = SnapshotOut {
        format: SNAPSHOT_FORMAT,
        version: SNAPSHOT_VERSION,
        saved_at,
        records: store.records().collect(),
        hash_index: store.hash_index().collect(),
    };

    let temp_path = temp_path_for(path);
    let written = write_file(&temp_path, &snapshot)
        .and_then(|()| fs::rename(&temp_path, path).map_err(RagError::from));
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    tracing::debug!(
        path = %path.display(),
        records = store.len(),
        "snapshot saved"
    );
    Ok(saved_at)
}

fn write_file(path: &Path, snapshot: &SnapshotOut<'_>) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, snapshot).map_err(std::io::Error::from)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

/// Read a snapshot from `path`.
///
/// `Ok(None)` means there is nothing to load. A file that exists but does not
/// decode to a consistent store is [`RagError::CorruptState`].
pub fn load(path: &Path) -> Result<Option<Snapshot>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no snapshot found");
        return Ok(None);
    }

    let bytes = fs::read(path)?;
    let snapshot = decode(&bytes)?;

    tracing::debug!(
        path = %path.display(),
        records = snapshot.store.len(),
        "snapshot loaded"
    );
    Ok(Some(snapshot))
}

fn decode(bytes: &[u8]) -> Result<Snapshot> {
    let raw: SnapshotIn = serde_json::from_slice(bytes)
        .map_err(|e| RagError::corrupt(format!("unreadable snapshot: {e}")))?;

    if raw.format != SNAPSHOT_FORMAT {
        return Err(RagError::corrupt(format!(
            "unexpected format tag {:?}",
            raw.format
        )));
    }
    if raw.version != SNAPSHOT_VERSION {
        return Err(RagError::corrupt(format!(
            "unsupported snapshot version {} (expected {})",
            raw.version, SNAPSHOT_VERSION
        )));
    }

    let store = ContentStore::from_records(raw.records)?;

    let index_matches = store.hash_index().count() == raw.hash_index.len()
        && store
            .hash_index()
            .zip(raw.hash_index.iter())
            .all(|((hash, id), (raw_hash, raw_id))| hash == raw_hash && id == raw_id);
    if !index_matches {
        return Err(RagError::corrupt(
            "hash index does not match the stored records",
        ));
    }

    Ok(Snapshot {
        store,
        saved_at: raw.saved_at,
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(n: usize) -> ContentStore {
        let mut store = ContentStore::new();
        for i in 0..n {
            store.add(vec![i as f32, 1.0, -0.5], &format!("chunk number {i}"));
        }
        store
    }

    fn roundtrip(store: &ContentStore) -> ContentStore {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        save(store, &path).unwrap();
        load(&path).unwrap().expect("snapshot should exist").store
    }

    #[test]
    fn test_roundtrip_empty() {
        let store = ContentStore::new();
        assert_eq!(roundtrip(&store), store);
    }

    #[test]
    fn test_roundtrip_single() {
        let store = store_with(1);
        assert_eq!(roundtrip(&store), store);
    }

    #[test]
    fn test_roundtrip_many_preserves_order_and_ids() {
        let store = store_with(25);
        let loaded = roundtrip(&store);

        assert_eq!(loaded, store);
        let ids: Vec<&str> = loaded.records().map(|r| r.id.as_str()).collect();
        let expected: Vec<String> = (1..=25).map(|i| format!("doc_{i}")).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_ids_continue_after_reload() {
        let mut loaded = roundtrip(&store_with(3));
        assert_eq!(loaded.add(vec![0.0, 0.0, 1.0], "chunk number 1"), "doc_2");
        assert_eq!(loaded.add(vec![0.0, 0.0, 1.0], "fresh text"), "doc_4");
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, b"{not json").unwrap();

        assert!(matches!(load(&path), Err(RagError::CorruptState(_))));
    }

    #[test]
    fn test_unknown_version_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        save(&store_with(1), &path).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        value["version"] = serde_json::json!(99);
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(matches!(load(&path), Err(RagError::CorruptState(_))));
    }

    #[test]
    fn test_diverged_hash_index_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        save(&store_with(2), &path).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        value["hash_index"][1][1] = serde_json::json!("doc_7");
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(matches!(load(&path), Err(RagError::CorruptState(_))));
    }

    #[test]
    fn test_save_refuses_non_finite_embedding() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        let mut store = store_with(1);
        store.add(vec![f32::INFINITY, 1.0, 0.0], "overflowed");

        let err = save(&store, &path).unwrap_err();
        assert!(matches!(err, RagError::InvalidArgument(ref msg) if msg.contains("doc_2")));
        assert!(!path.exists());
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_failed_save_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory at the target makes the final rename fail
        let path = dir.path().join("snapshot.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        assert!(save(&store_with(2), &path).is_err());
        assert!(!temp_path_for(&path).exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("snapshot.json");
        save(&store_with(2), &path).unwrap();

        assert!(path.exists());
        assert!(!temp_path_for(&path).exists());
    }
}
