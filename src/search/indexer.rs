use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::error::{RagError, Result};

use super::chunker::Chunker;
use super::embedder::Embedder;
use super::loader::load_text;
use super::store::VectorStore;

const BATCH_SIZE: usize = 32;

/// Chunk -> embed -> store.
///
/// Embeddings are fetched before the store is touched; the store lock is only
/// taken for the final insert.
pub struct Indexer {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexResult {
    pub chunks: usize,
    pub added: usize,
    pub duplicates: usize,
}

impl Indexer {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, chunker: Chunker) -> Self {
        Self {
            store,
            embedder,
            chunker,
        }
    }

    pub async fn index_file(&self, path: &Path) -> Result<IndexResult> {
        let text = load_text(path)?;
        let result = self.index_text(&text).await?;
        tracing::info!(
            path = %path.display(),
            chunks = result.chunks,
            added = result.added,
            "indexed file"
        );
        Ok(result)
    }

    pub async fn index_text(&self, text: &str) -> Result<IndexResult> {
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Ok(IndexResult::default());
        }

        // Content already stored keeps its first embedding, so don't pay for a new one.
        let mut seen = HashSet::new();
        let pending: Vec<String> = chunks
            .iter()
            .filter(|chunk| !self.store.contains(chunk))
            .filter(|chunk| seen.insert(chunk.as_str()))
            .cloned()
            .collect();

        let items = self.embed_chunks(pending).await?;

        let before = self.store.len();
        self.store.add_batch(items);
        let added = self.store.len() - before;

        Ok(IndexResult {
            chunks: chunks.len(),
            added,
            duplicates: chunks.len() - added,
        })
    }

    async fn embed_chunks(&self, chunks: Vec<String>) -> Result<Vec<(Vec<f32>, String)>> {
        let mut items = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(BATCH_SIZE) {
            let embeddings = self.embedder.embed_batch(batch).await?;
            if embeddings.len() != batch.len() {
                return Err(RagError::EmbeddingUnavailable(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            for (text, vector) in batch.iter().zip(embeddings) {
                items.push((vector, text.clone()));
            }
        }

        Ok(items)
    }
}
