use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::{snapshot, ContentStore, Record, ScoredId, SearchHit, StoreStats, VectorStore};

#[derive(Debug, Default)]
struct State {
    store: ContentStore,
    last_saved: Option<DateTime<Utc>>,
}

/// [`ContentStore`] behind a read-write lock, persisted to one snapshot file.
pub struct FileStore {
    path: PathBuf,
    state: RwLock<State>,
}

impl FileStore {
    /// An empty store that will persist to `path`. Nothing is read from disk.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: RwLock::new(State::default()),
        }
    }

    /// Open the store at `path`, loading the snapshot if one exists.
    pub fn open(path: PathBuf) -> Result<Self> {
        let store = Self::new(path);
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the current records under a shared lock.
    pub fn with_store<R>(&self, f: impl FnOnce(&ContentStore) -> R) -> R {
        f(&self.state.read().store)
    }
}

impl VectorStore for FileStore {
    fn add(&self, embedding: Vec<f32>, text: &str) -> String {
        self.state.write().store.add(embedding, text)
    }

    fn add_batch(&self, items: Vec<(Vec<f32>, String)>) -> Vec<String> {
        let mut state = self.state.write();
        items
            .into_iter()
            .map(|(embedding, text)| state.store.add(embedding, &text))
            .collect()
    }

    fn query(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<ScoredId>> {
        self.state.read().store.query(query_embedding, top_k)
    }

    fn query_hits(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        self.state.read().store.query_hits(query_embedding, top_k)
    }

    fn get(&self, id: &str) -> Option<Record> {
        self.state.read().store.get(id).cloned()
    }

    fn contains(&self, text: &str) -> bool {
        self.state.read().store.contains_text(text)
    }

    fn len(&self) -> usize {
        self.state.read().store.len()
    }

    fn persist(&self) -> Result<()> {
        let mut state = self.state.write();
        let saved_at = snapshot::save(&state.store, &self.path)?;
        state.last_saved = Some(saved_at);
        Ok(())
    }

    fn load(&self) -> Result<bool> {
        let mut state = self.state.write();
        match snapshot::load(&self.path)? {
            Some(loaded) => {
                state.store = loaded.store;
                state.last_saved = Some(loaded.saved_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn stats(&self) -> Result<StoreStats> {
        let state = self.state.read();

        let snapshot_bytes = if self.path.exists() {
            fs::metadata(&self.path)?.len()
        } else {
            0
        };

        Ok(StoreStats {
            records: state.store.len(),
            dimensions: state.store.dimensions(),
            snapshot_bytes,
            last_saved: state.last_saved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_persist_and_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::new(path.clone());
        store.add(vec![1.0, 0.0], "alpha");
        store.add(vec![0.0, 1.0], "beta");
        store.persist().unwrap();

        let reopened = FileStore::open(path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("doc_2").unwrap().text, "beta");
        assert!(reopened.stats().unwrap().last_saved.is_some());
    }

    #[test]
    fn test_load_without_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("missing.json"));

        assert!(!store.load().unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_replaces_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::new(path);
        store.add(vec![1.0], "saved");
        store.persist().unwrap();
        store.add(vec![1.0], "unsaved");
        assert_eq!(store.len(), 2);

        assert!(store.load().unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_batch_dedups_within_batch() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("store.json"));

        let ids = store.add_batch(vec![
            (vec![1.0], "same".to_string()),
            (vec![2.0], "same".to_string()),
            (vec![3.0], "other".to_string()),
        ]);

        assert_eq!(ids, vec!["doc_1", "doc_1", "doc_2"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_stats() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("store.json"));

        let empty = store.stats().unwrap();
        assert_eq!(empty.records, 0);
        assert_eq!(empty.dimensions, None);
        assert_eq!(empty.snapshot_bytes, 0);

        store.add(vec![0.5, 0.5, 0.5], "text");
        store.persist().unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.records, 1);
        assert_eq!(stats.dimensions, Some(3));
        assert!(stats.snapshot_bytes > 0);
    }

    #[test]
    fn test_concurrent_adds_keep_ids_unique() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::new(dir.path().join("store.json")));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..50 {
                        store.add(vec![1.0, t as f32], &format!("thread {t} item {i}"));
                        store.query(&[1.0, 0.0], 3).unwrap();
                        let hits = store.query_hits(&[1.0, 0.0], 3).unwrap();
                        assert!(hits.iter().all(|h| h.text.starts_with("thread ")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 200);
        store.with_store(|s| {
            let ids: Vec<String> = s.records().map(|r| r.id.clone()).collect();
            let expected: Vec<String> = (1..=200).map(|i| format!("doc_{i}")).collect();
            assert_eq!(ids, expected);
        });
    }
}
