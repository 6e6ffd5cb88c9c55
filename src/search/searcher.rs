use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::{RagError, Result};

use super::embedder::Embedder;
use super::generator::{GenerateOptions, Generator, DEFAULT_SYSTEM_PROMPT};
use super::store::{SearchHit, VectorStore};

/// Query-side orchestration: embed the question, rank stored chunks, and
/// optionally hand the best ones to a generator.
pub struct Searcher {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    generator: Option<Arc<dyn Generator>>,
    system_prompt: String,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SearchHit>,
}

impl Searcher {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            generator: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            options: GenerateOptions::new(),
        }
    }

    pub fn with_generator(
        mut self,
        generator: Arc<dyn Generator>,
        system_prompt: impl Into<String>,
        options: GenerateOptions,
    ) -> Self {
        self.generator = Some(generator);
        self.system_prompt = system_prompt.into();
        self.options = options;
        self
    }

    /// Vector search, resolved back to record text
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        // Embed before touching the store
        let query_vector = self.embedder.embed(query).await?;

        let hits = self.store.query_hits(&query_vector, top_k)?;

        tracing::info!(results = hits.len(), top_k, "search complete");
        Ok(hits)
    }

    /// Retrieve context for `question` and ask the generator to answer it.
    pub async fn answer(&self, question: &str, top_k: usize) -> Result<Answer> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| RagError::invalid("no answer generator configured"))?;

        let sources = self.search(question, top_k).await?;
        let prompt = build_prompt(question, &sources);

        let text = generator
            .generate(&prompt, &self.system_prompt, &self.options)
            .await?;

        Ok(Answer { text, sources })
    }
}

/// Numbered context blocks followed by the question.
pub fn build_prompt(question: &str, hits: &[SearchHit]) -> String {
    let mut prompt = String::new();

    if hits.is_empty() {
        prompt.push_str("No context was found for this question.\n\n");
    } else {
        prompt.push_str(
            "Answer the question using only the context below. \
             If the context does not contain the answer, say so.\n\nContext:\n",
        );
        for (i, hit) in hits.iter().enumerate() {
            let _ = writeln!(prompt, "[{}] {}\n", i + 1, hit.text);
        }
    }

    let _ = write!(prompt, "Question: {question}");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, text: &str) -> SearchHit {
        SearchHit {
            id: id.to_string(),
            score: 1.0,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_build_prompt_numbers_context() {
        let prompt = build_prompt(
            "What are llamas related to?",
            &[hit("doc_1", "camels"), hit("doc_4", "vicuñas")],
        );

        assert!(prompt.contains("[1] camels"));
        assert!(prompt.contains("[2] vicuñas"));
        assert!(prompt.ends_with("Question: What are llamas related to?"));
    }

    #[test]
    fn test_build_prompt_without_context() {
        let prompt = build_prompt("anything?", &[]);
        assert!(prompt.starts_with("No context"));
        assert!(prompt.ends_with("Question: anything?"));
    }
}
