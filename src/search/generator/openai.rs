//! Chat-completions client for any OpenAI-compatible endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::{RagError, Result};

use super::{GenerateOptions, Generator};

pub struct OpenAiGenerator {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RagError::GenerationFailed(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
        })
    }

    fn request_body(&self, prompt: &str, system_prompt: &str, options: &GenerateOptions) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": prompt },
            ],
        });

        if let Value::Object(map) = &mut body {
            for (key, value) in options {
                if key != "model" && key != "messages" {
                    map.insert(key.clone(), value.clone());
                }
            }
        }
        body
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String> {
        let body = self.request_body(prompt, system_prompt, options);

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RagError::GenerationFailed(format!("request to {} failed: {e}", self.base_url)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RagError::GenerationFailed(format!(
                "API error ({status}): {text}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| RagError::GenerationFailed(format!("malformed response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RagError::GenerationFailed("response has no message content".to_string()))?;

        tracing::debug!(model = %self.model, chars = content.len(), "generation complete");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> OpenAiGenerator {
        OpenAiGenerator::new("https://example.invalid/v1/", "", "test-model", 5).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let body = generator().request_body("question", "be brief", &GenerateOptions::new());

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "be brief");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "question");
    }

    #[test]
    fn test_options_merged_but_cannot_override_messages() {
        let mut options = GenerateOptions::new();
        options.insert("temperature".to_string(), json!(0.2));
        options.insert("messages".to_string(), json!([]));

        let body = generator().request_body("q", "s", &options);
        assert_eq!(body["temperature"], json!(0.2));
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_base_url_trimmed() {
        assert_eq!(generator().base_url, "https://example.invalid/v1");
    }

    #[test]
    fn test_response_without_choices() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
