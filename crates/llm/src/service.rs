//! The interface every player decision goes through.

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::LlmResult;
use crate::types::ChatMessage;

/// A named JSON schema the response must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub schema: Option<ResponseSchema>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Short tag for logs and telemetry, e.g. "mafia_vote".
    pub label: String,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            schema: None,
            temperature: None,
            max_tokens: None,
            label: String::new(),
        }
    }

    pub fn with_schema(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.schema = Some(ResponseSchema {
            name: name.into(),
            schema,
        });
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: String,
    /// Parsed payload when the request carried a schema and the output parsed.
    pub structured: Option<Value>,
}

impl Completion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            structured: None,
        }
    }

    pub fn structured(value: Value) -> Self {
        Self {
            content: value.to_string(),
            structured: Some(value),
        }
    }
}

/// Remote reasoning for one agent decision.
///
/// Implementations must return promptly with [`crate::LlmError::Cancelled`]
/// once `cancel` fires.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
        cancel: &CancellationToken,
    ) -> LlmResult<Completion>;
}
