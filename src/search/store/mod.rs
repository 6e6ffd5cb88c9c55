mod content;
mod file;
pub mod snapshot;
mod types;

pub use content::{hash_content, ContentStore};
pub use file::FileStore;
pub use snapshot::Snapshot;
pub use types::{Record, ScoredId, SearchHit, StoreStats};

use crate::error::Result;

/// Shared handle to a record store.
///
/// Mutating calls take the store exclusively; `query`, `query_hits`, `get` and `len` may
/// run alongside each other but never alongside `add`, `persist` or `load`.
pub trait VectorStore: Send + Sync {
    fn add(&self, embedding: Vec<f32>, text: &str) -> String;
    /// Insert many chunks under a single exclusive lock, returning one id per item.
    fn add_batch(&self, items: Vec<(Vec<f32>, String)>) -> Vec<String>;
    fn query(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<ScoredId>>;
    /// Rank and resolve text in one read, so a concurrent `load` cannot
    /// split the two.
    fn query_hits(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SearchHit>>;
    fn get(&self, id: &str) -> Option<Record>;
    /// Whether a record with exactly this text is stored.
    fn contains(&self, text: &str) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn persist(&self) -> Result<()>;
    /// Replace the in-memory state with the snapshot on disk.
    /// Returns `false` when there is no snapshot to load.
    fn load(&self) -> Result<bool>;
    fn stats(&self) -> Result<StoreStats>;
}
