mod ollama;

pub use ollama::OllamaEmbedder;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Text-to-vector service.
///
/// Implementations return one flat vector per input text; any nesting in the
/// service response is resolved here, never by the store.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    fn model(&self) -> &str;
    async fn health_check(&self) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    pub provider: String,
    pub model: String,
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            endpoint: None,
            timeout_secs: 120,
        }
    }
}

pub fn create_embedder(config: &EmbedderConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        "ollama" => {
            let endpoint = config
                .endpoint
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string());
            Ok(Box::new(OllamaEmbedder::new(
                &endpoint,
                &config.model,
                config.timeout_secs,
            )?))
        }
        other => Err(RagError::invalid(format!(
            "unknown embedding provider '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_rejected() {
        let config = EmbedderConfig {
            provider: "mystery".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_embedder(&config),
            Err(RagError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_default_provider_builds() {
        let embedder = create_embedder(&EmbedderConfig::default()).unwrap();
        assert_eq!(embedder.model(), "all-minilm");
    }
}
