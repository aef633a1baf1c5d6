//! Chat-completion wire types (OpenAI-compatible)

use crate::error::{Error, Result};
use crate::types::TokenUsage;
use serde::{Deserialize, Serialize};

/// Completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// Messages in the conversation
    pub messages: Vec<Message>,
    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens for completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a new completion request
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    #[serde(default)]
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message
    System,
    /// User message
    User,
    /// Assistant message
    Assistant,
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Unique identifier
    #[serde(default)]
    pub id: String,
    /// Model used
    #[serde(default)]
    pub model: String,
    /// Choices
    pub choices: Vec<Choice>,
    /// Token usage, when the server reports it
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Trimmed content of the first choice
    pub fn text(&self) -> Result<String> {
        self.choices
            .first()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| Error::completion("response contained no choices"))
    }

    /// Token usage, zero when the server omitted it
    pub fn token_usage(&self) -> TokenUsage {
        self.usage.clone().map(TokenUsage::from).unwrap_or_default()
    }
}

/// Choice in completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Index of the choice
    #[serde(default)]
    pub index: u32,
    /// Message content
    pub message: Message,
    /// Finish reason
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens
    pub prompt_tokens: u64,
    /// Completion tokens
    pub completion_tokens: u64,
    /// Total tokens
    pub total_tokens: u64,
}

impl From<Usage> for TokenUsage {
    fn from(usage: Usage) -> Self {
        TokenUsage::new(usage.prompt_tokens, usage.completion_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = CompletionRequest::new(
            "gemma3",
            vec![Message::system("be brief"), Message::user("hello")],
        )
        .with_temperature(0.0)
        .with_max_tokens(10);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gemma3");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["max_tokens"], 10);
    }

    #[test]
    fn test_unset_parameters_are_omitted() {
        let request = CompletionRequest::new("gemma3", vec![Message::user("hi")]);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_response_text_is_trimmed() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": "gemma3",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "  {3.50}\n"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 80, "completion_tokens": 6, "total_tokens": 86}
        }"#;
        let response: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text().unwrap(), "{3.50}");
        assert_eq!(response.token_usage().total_tokens, 86);
    }

    #[test]
    fn test_response_without_choices_is_an_error() {
        let response: CompletionResponse =
            serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(response.text(), Err(Error::Completion(_))));
        assert_eq!(response.token_usage(), TokenUsage::default());
    }
}
