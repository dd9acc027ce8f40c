use serde_json::json;
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("error while sending llm request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("llm response is missing choices[0].message.content")]
    MalformedResponse,
}

/// Seam for the external text-generation capability. The only behavior
/// required of an implementation is returning prose for a prompt; tests
/// substitute canned ones.
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

/// OpenAI-compatible chat completions client.
#[derive(Debug)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        ChatClient {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }
}

impl TextGenerator for ChatClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": vec![json!({"role": "user", "content": prompt})],
                "temperature": 0,
                "max_tokens": max_tokens,
            }))
            .send()
            .await
            .and_then(|response| response.error_for_status())?;

        let body = response.json::<serde_json::Value>().await?;
        let message = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(GenerationError::MalformedResponse)?;

        Ok(message.to_string())
    }
}
