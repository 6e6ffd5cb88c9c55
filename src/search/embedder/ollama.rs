use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{RagError, Result};

use super::Embedder;

pub struct OllamaEmbedder {
    endpoint: String,
    model: String,
    client: Client,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    truncate: bool,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Option<EmbeddingPayload>,
}

/// `/api/embed` answers with one vector per input; older servers answer a
/// single input with a bare vector.
#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddingPayload {
    Batch(Vec<Vec<f32>>),
    Single(Vec<f32>),
}

impl EmbeddingPayload {
    fn into_vectors(self) -> Vec<Vec<f32>> {
        match self {
            Self::Batch(vectors) => vectors,
            Self::Single(vector) => vec![vector],
        }
    }
}

/// One usable vector per input: non-empty and every component finite.
fn check_vectors(vectors: &[Vec<f32>], expected: usize) -> Result<()> {
    if vectors.len() != expected {
        return Err(RagError::EmbeddingUnavailable(format!(
            "expected {} embeddings, got {}",
            expected,
            vectors.len()
        )));
    }
    if vectors.iter().any(|v| v.is_empty()) {
        return Err(RagError::EmbeddingUnavailable(
            "service returned an empty vector".to_string(),
        ));
    }
    if let Some(idx) = vectors
        .iter()
        .position(|v| v.iter().any(|x| !x.is_finite()))
    {
        return Err(RagError::EmbeddingUnavailable(format!(
            "embedding {} contains a non-finite value",
            idx + 1
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl OllamaEmbedder {
    pub fn new(endpoint: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RagError::EmbeddingUnavailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }

    fn connect_error(&self) -> RagError {
        RagError::EmbeddingUnavailable(format!(
            "cannot connect to Ollama at {}. Is Ollama running? (start it with `ollama serve`)",
            self.endpoint
        ))
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::EmbeddingUnavailable("no embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.model,
            input: texts,
            truncate: true,
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    self.connect_error()
                } else {
                    RagError::EmbeddingUnavailable(format!("Ollama request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 || body.contains("not found") {
                return Err(RagError::EmbeddingUnavailable(format!(
                    "model '{}' not found, pull it with `ollama pull {}`",
                    self.model, self.model
                )));
            }

            return Err(RagError::EmbeddingUnavailable(format!(
                "Ollama error ({status}): {body}"
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RagError::EmbeddingUnavailable(format!("malformed response: {e}")))?;

        let vectors = embed_response
            .embeddings
            .ok_or_else(|| {
                RagError::EmbeddingUnavailable("response has no `embeddings` field".to_string())
            })?
            .into_vectors();

        check_vectors(&vectors, texts.len())?;

        tracing::debug!(count = vectors.len(), model = %self.model, "embedded batch");
        Ok(vectors)
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.endpoint))
            .send()
            .await
            .map_err(|_| self.connect_error())?;

        if !response.status().is_success() {
            return Err(RagError::EmbeddingUnavailable(
                "Ollama health check failed".to_string(),
            ));
        }

        let tags: OllamaTagsResponse = response
            .json()
            .await
            .map_err(|e| RagError::EmbeddingUnavailable(format!("malformed tags response: {e}")))?;
        let model_available = tags
            .models
            .iter()
            .any(|m| m.name.starts_with(&self.model) || m.name == format!("{}:latest", self.model));

        if !model_available {
            return Err(RagError::EmbeddingUnavailable(format!(
                "model '{}' not installed, pull it with `ollama pull {}`",
                self.model, self.model
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let embedder = OllamaEmbedder::new("http://localhost:11434/", "all-minilm", 5).unwrap();
        assert_eq!(embedder.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_response_batch_payload() {
        let parsed: EmbedResponse =
            serde_json::from_str(r#"{"model":"m","embeddings":[[0.5,0.25],[0.75,1.0]]}"#).unwrap();
        let vectors = parsed.embeddings.unwrap().into_vectors();
        assert_eq!(vectors, vec![vec![0.5, 0.25], vec![0.75, 1.0]]);
    }

    #[test]
    fn test_response_flat_payload() {
        let parsed: EmbedResponse = serde_json::from_str(r#"{"embeddings":[0.5,0.25]}"#).unwrap();
        let vectors = parsed.embeddings.unwrap().into_vectors();
        assert_eq!(vectors, vec![vec![0.5, 0.25]]);
    }

    #[test]
    fn test_response_missing_field() {
        let parsed: EmbedResponse = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert!(parsed.embeddings.is_none());
    }

    #[test]
    fn test_check_vectors() {
        assert!(check_vectors(&[vec![0.5, 0.25]], 1).is_ok());
        assert!(matches!(
            check_vectors(&[vec![0.5]], 2),
            Err(RagError::EmbeddingUnavailable(_))
        ));
        assert!(matches!(
            check_vectors(&[vec![]], 1),
            Err(RagError::EmbeddingUnavailable(_))
        ));
    }

    #[test]
    fn test_check_vectors_rejects_non_finite() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let vectors = vec![vec![0.5, 0.25], vec![bad, 1.0]];
            assert!(matches!(
                check_vectors(&vectors, 2),
                Err(RagError::EmbeddingUnavailable(_))
            ));
        }

        // An out-of-range number in the payload decodes to infinity
        let parsed: EmbedResponse = serde_json::from_str(r#"{"embeddings":[[1e39,0.5]]}"#).unwrap();
        let vectors = parsed.embeddings.unwrap().into_vectors();
        assert!(check_vectors(&vectors, 1).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        let embedder = OllamaEmbedder::new("http://127.0.0.1:1", "all-minilm", 2).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingUnavailable(_)));
    }
}
