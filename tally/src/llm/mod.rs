//! Text-completion capability: the LLM port used by the analysis nodes.
//!
//! Nodes send a single user message carrying the prompt and read back the
//! assistant text. Implementations: `MockLlm` (scripted), `ChatOpenAI` (real API).

mod mock;
mod openai;

pub use mock::MockLlm;
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::Message;

/// Token usage for one LLM call (prompt + completion).
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    /// Tokens in the prompt (input).
    pub prompt_tokens: u32,
    /// Tokens in the completion (output).
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion).
    pub total_tokens: u32,
}

/// Response from an LLM completion.
#[derive(Clone, Debug, Default)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Token usage for this call, when available.
    pub usage: Option<LlmUsage>,
}

/// LLM client: given messages, returns assistant text.
///
/// Shared by every `analyze` call of an `Analyzer`, so implementations must tolerate
/// concurrent reentrant use. Any error is treated by callers as an opaque capability failure.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke one turn: read messages, return assistant content.
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;

    /// Convenience for single-prompt completion: `complete(prompt) -> text`.
    async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
        let response = self.invoke(&[Message::user(prompt)]).await?;
        Ok(response.content)
    }
}
