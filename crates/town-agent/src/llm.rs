//! `LlmClient`: the contract every agent's language-model backend satisfies
//! (spec.md §6 "LLM contract").

use std::pin::Pin;

use futures::Stream;

use crate::error::LlmResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// A `chat` request. `stop` names sequences that truncate the response
/// wherever they first appear; `stream` requests an incremental response.
#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub stop: Vec<String>,
    pub stream: bool,
}

pub type ChatStream = Pin<Box<dyn Stream<Item = LlmResult<String>> + Send>>;

pub enum ChatResponse {
    Complete(String),
    Streaming(ChatStream),
}

/// Pluggable language-model backend. Implementations are free to call a
/// remote HTTP API (`reqwest`), a local model, or — in tests — return canned
/// responses.
pub trait LlmClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> LlmResult<ChatResponse>;
    async fn embed(&self, texts: &[String]) -> LlmResult<Vec<Vec<f32>>>;
    async fn moderate(&self, text: &str) -> LlmResult<bool>;
}
