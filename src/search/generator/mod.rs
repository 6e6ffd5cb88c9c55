mod openai;

pub use openai::OpenAiGenerator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RagError, Result};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Extra request parameters (temperature, max_tokens, ...) passed through
/// to the service untouched.
pub type GenerateOptions = Map<String, Value>;

/// Prompt-to-text service used to answer questions over retrieved context.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub model: String,
    pub endpoint: String,
    pub api_key: String,
    pub system_prompt: String,
    pub timeout_secs: u64,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout_secs: 120,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl GeneratorConfig {
    pub fn options(&self) -> GenerateOptions {
        let mut options = GenerateOptions::new();
        if let Some(temperature) = self.temperature {
            options.insert("temperature".to_string(), Value::from(temperature));
        }
        if let Some(max_tokens) = self.max_tokens {
            options.insert("max_tokens".to_string(), Value::from(max_tokens));
        }
        options
    }
}

pub fn create_generator(config: &GeneratorConfig) -> Result<Box<dyn Generator>> {
    if config.model.is_empty() {
        return Err(RagError::invalid(
            "no generation model configured (set [generator].model or LLM_MODEL)",
        ));
    }
    Ok(Box::new(OpenAiGenerator::new(
        &config.endpoint,
        &config.api_key,
        &config.model,
        config.timeout_secs,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_only_include_set_values() {
        let mut config = GeneratorConfig::default();
        assert!(config.options().is_empty());

        config.temperature = Some(0.5);
        config.max_tokens = Some(256);
        let options = config.options();
        assert_eq!(options["temperature"], Value::from(0.5));
        assert_eq!(options["max_tokens"], Value::from(256));
    }

    #[test]
    fn test_missing_model_rejected() {
        assert!(matches!(
            create_generator(&GeneratorConfig::default()),
            Err(RagError::InvalidArgument(_))
        ));
    }
}
