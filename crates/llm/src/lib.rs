//! Reasoning-service access for game agents
//!
//! [`ReasoningService`] is the seam the engine talks to; [`OpenRouterClient`]
//! is the HTTP implementation for OpenRouter-compatible endpoints.

pub mod client;
pub mod error;
pub mod json;
pub mod service;
pub mod types;

pub use client::{OpenRouterClient, RetryPolicy};
pub use error::{LlmError, LlmResult};
pub use service::{Completion, CompletionRequest, ReasoningService, ResponseSchema};
pub use types::{ChatMessage, MessageRole};
