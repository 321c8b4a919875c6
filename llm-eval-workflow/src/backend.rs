//! OpenAI-compatible `/v1/chat/completions` inference backend.

use async_trait::async_trait;
use futures::future::try_join_all;
use llm_eval_core::{Completion, CoreError, GenerationParams, InferenceBackend, Message, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Sends one request per conversation; requests of a batch run concurrently
/// and completions come back in batch order.
#[derive(Debug, Clone)]
pub struct ChatCompletionsBackend {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionsBackend {
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self> {
        Self::build(base_url, model.into(), None)
    }

    /// Same as [`new`](Self::new) with a per-request timeout.
    pub fn with_request_timeout(base_url: &str, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::build(base_url, model.into(), Some(timeout))
    }

    fn build(base_url: &str, model: String, timeout: Option<Duration>) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| CoreError::Validation(format!("invalid inference url '{}': {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("v1/chat/completions")
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| CoreError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            model,
            api_key: None,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn complete(&self, messages: &[Message], params: &GenerationParams) -> Result<Completion> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CoreError::Timeout(format!("inference request: {}", e))
            } else {
                CoreError::Inference(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CoreError::Inference(format!("HTTP {}: {}", status, text)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Inference(format!("malformed response: {}", e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CoreError::Inference("response has no choices".to_string()))?;

        Ok(Completion::new(text))
    }
}

#[async_trait]
impl InferenceBackend for ChatCompletionsBackend {
    async fn infer_batch(
        &self,
        conversations: &[Vec<Message>],
        params: &GenerationParams,
    ) -> Result<Vec<Completion>> {
        try_join_all(conversations.iter().map(|messages| self.complete(messages, params))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let backend = ChatCompletionsBackend::new("http://localhost:8000/proxy", "m").unwrap();
        assert_eq!(
            backend.endpoint().as_str(),
            "http://localhost:8000/proxy/v1/chat/completions"
        );
    }

    #[test]
    fn test_endpoint_from_root() {
        let backend = ChatCompletionsBackend::new("http://localhost:8000", "m").unwrap();
        assert_eq!(
            backend.endpoint().as_str(),
            "http://localhost:8000/v1/chat/completions"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(ChatCompletionsBackend::new("not a url", "m").is_err());
    }
}
