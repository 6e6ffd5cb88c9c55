use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::error::{RagError, Result};
use crate::search::ranker;

use super::{Record, ScoredId, SearchHit};

const ID_PREFIX: &str = "doc_";

/// In-memory record set, deduplicated by content hash.
///
/// `records` and `id_by_hash` always describe the same set: one entry each
/// per record, and `id_by_hash[r.content_hash] == r.id` for every record.
/// Iteration order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentStore {
    records: IndexMap<String, Record>,
    id_by_hash: IndexMap<String, String>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chunk and return its id.
    ///
    /// Text already present returns the existing id and leaves the stored
    /// embedding untouched.
    pub fn add(&mut self, embedding: Vec<f32>, text: &str) -> String {
        let content_hash = hash_content(text);

        if let Some(existing) = self.id_by_hash.get(&content_hash) {
            tracing::debug!(id = %existing, "duplicate content, keeping first record");
            return existing.clone();
        }

        let id = format!("{}{}", ID_PREFIX, self.records.len() + 1);
        self.id_by_hash.insert(content_hash.clone(), id.clone());
        self.records.insert(
            id.clone(),
            Record {
                id: id.clone(),
                content_hash,
                text: text.to_string(),
                embedding,
            },
        );

        tracing::debug!(id = %id, "record added");
        id
    }

    pub fn query(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<ScoredId>> {
        ranker::rank(
            query_embedding,
            self.records
                .values()
                .map(|r| (r.id.as_str(), r.embedding.as_slice())),
            top_k,
        )
    }

    /// [`query`](Self::query) with each id resolved to its text.
    pub fn query_hits(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        self.query(query_embedding, top_k)?
            .into_iter()
            .map(|scored| match self.records.get(&scored.id) {
                Some(record) => Ok(SearchHit {
                    text: record.text.clone(),
                    id: scored.id,
                    score: scored.score,
                }),
                None => Err(RagError::corrupt(format!(
                    "ranked id {} has no record",
                    scored.id
                ))),
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn id_for_text(&self, text: &str) -> Option<&str> {
        self.id_by_hash
            .get(&hash_content(text))
            .map(String::as_str)
    }

    pub fn contains_text(&self, text: &str) -> bool {
        self.id_for_text(text).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// `(content_hash, id)` pairs in insertion order.
    pub fn hash_index(&self) -> impl Iterator<Item = (&str, &str)> {
        self.id_by_hash
            .iter()
            .map(|(hash, id)| (hash.as_str(), id.as_str()))
    }

    /// Embedding length of the first record, if any.
    pub fn dimensions(&self) -> Option<usize> {
        self.records.values().next().map(|r| r.embedding.len())
    }

    /// Rebuild a store from records in insertion order, checking every
    /// invariant that `add` maintains.
    pub(crate) fn from_records(records: Vec<Record>) -> Result<Self> {
        let mut store = Self::new();

        for (idx, record) in records.into_iter().enumerate() {
            let expected_id = format!("{}{}", ID_PREFIX, idx + 1);
            if record.id != expected_id {
                return Err(RagError::corrupt(format!(
                    "record {} has id {:?}, expected {:?}",
                    idx + 1,
                    record.id,
                    expected_id
                )));
            }

            let actual_hash = hash_content(&record.text);
            if record.content_hash != actual_hash {
                return Err(RagError::corrupt(format!(
                    "content hash of {} does not match its text",
                    record.id
                )));
            }

            if let Some(previous) = store
                .id_by_hash
                .insert(record.content_hash.clone(), record.id.clone())
            {
                return Err(RagError::corrupt(format!(
                    "{} duplicates the content of {}",
                    record.id, previous
                )));
            }
            store.records.insert(record.id.clone(), record);
        }

        Ok(store)
    }
}

/// SHA-256 of the text's UTF-8 bytes, lowercase hex.
pub fn hash_content(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
