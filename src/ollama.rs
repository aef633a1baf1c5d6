//! Client for a local model daemon exposing the OpenAI-compatible API
//!
//! Ollama serves this API under `http://localhost:11434/v1`; vLLM and other
//! servers with the same routes work unchanged.
//!
//! ```bash
//! ollama pull gemma3
//! ollama serve
//! ```

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::llm_client::LlmClient;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Chat-completion client for a local model daemon
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: ServiceConfig,
}

impl OllamaClient {
    /// Create a new client with the given configuration
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }

    /// List the models the daemon has available
    pub async fn get_models(&self) -> Result<ModelsResponse> {
        let url = format!("{}/models", self.config.base());

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.api_key())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::completion(format!(
                "Failed to get models: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let url = format!("{}/chat/completions", self.config.base());
        debug!(model = %request.model, url = %url, "sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::completion(format!(
                "Request failed with status {}: {}",
                status, error_text
            )));
        }

        let completion: CompletionResponse = response.json().await?;
        Ok(completion)
    }

    fn client_type(&self) -> &str {
        "ollama"
    }

    fn endpoint(&self) -> &str {
        self.config.base()
    }
}

/// Models response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    /// Object type (always "list")
    pub object: String,
    /// List of available models
    pub data: Vec<ModelInfo>,
}

/// Information about a model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model ID
    pub id: String,
    /// Object type (always "model")
    pub object: String,
    /// Creation timestamp
    #[serde(default)]
    pub created: u64,
    /// Owner organization
    #[serde(default)]
    pub owned_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Message;
    use std::time::Duration;

    fn client_for(server: &mockito::ServerGuard) -> OllamaClient {
        let config = ServiceConfig::new(&format!("{}/v1", server.url()))
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        OllamaClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_complete_posts_chat_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer ollama")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "gemma3",
                "temperature": 0.0,
                "max_tokens": 10,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "usr"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":"c1","model":"gemma3","choices":[{"index":0,"message":{"role":"assistant","content":"{2.75}"},"finish_reason":"stop"}]}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let request = CompletionRequest::new(
            "gemma3",
            vec![Message::system("sys"), Message::user("usr")],
        )
        .with_temperature(0.0)
        .with_max_tokens(10);

        let response = client.complete(request).await.unwrap();
        assert_eq!(response.text().unwrap(), "{2.75}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_surfaces_service_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(404)
            .with_body(r#"{"error":"model 'nope' not found"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .complete(CompletionRequest::new("nope", vec![Message::user("hi")]))
            .await
            .unwrap_err();

        match err {
            Error::Completion(msg) => {
                assert!(msg.contains("404"));
                assert!(msg.contains("not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_models() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"object":"list","data":[{"id":"gemma3:latest","object":"model","created":1700000000,"owned_by":"library"}]}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let models = client.get_models().await.unwrap();
        assert_eq!(models.data.len(), 1);
        assert_eq!(models.data[0].id, "gemma3:latest");
        assert_eq!(client.client_type(), "ollama");
        assert!(client.endpoint().ends_with("/v1"));
    }
}
