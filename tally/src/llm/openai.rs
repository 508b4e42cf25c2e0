//! OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Uses the OpenAI-compatible Chat Completions API. Requires `OPENAI_API_KEY` (or
//! explicit config); `OPENAI_BASE_URL` selects a compatible endpoint.
//!
//! **Interaction**: Implements `LlmClient`; used by the analysis nodes like `MockLlm`.

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse, LlmUsage};
use crate::message::Message;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};

/// OpenAI Chat Completions client.
///
/// Uses `OPENAI_API_KEY` from the environment by default; or provide
/// config via `ChatOpenAI::with_config`.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl ChatOpenAI {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            temperature: None,
        }
    }

    /// Build client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: None,
        }
    }

    /// Build client from an API key and optional base URL (e.g. a local proxy).
    pub fn from_credentials(
        api_key: impl Into<String>,
        base_url: Option<&str>,
        model: impl Into<String>,
    ) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = base_url {
            config = config.with_api_base(base);
        }
        Self::with_config(config, model)
    }

    /// Set temperature (0–2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Model name sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert our `Message` list to OpenAI request messages.
    fn messages_to_request(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System(s) => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(s.as_str()),
                ),
                Message::User(s) => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(s.as_str()),
                ),
                Message::Assistant(s) => {
                    ChatCompletionRequestMessage::Assistant((s.as_str()).into())
                }
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(Self::messages_to_request(messages));
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        let request = args.build().map_err(|e| {
            AgentError::ExecutionFailed(format!("OpenAI request build failed: {}", e))
        })?;

        debug!(
            model = %self.model,
            message_count = messages.len(),
            temperature = ?self.temperature,
            "OpenAI chat create"
        );

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::ExecutionFailed(format!("OpenAI API error: {}", e)))?;

        trace!(response = ?response, "OpenAI response body");

        let usage = response.usage.as_ref().map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            AgentError::ExecutionFailed("OpenAI returned no choices".to_string())
        })?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_to_request_keeps_order_and_roles() {
        let out = ChatOpenAI::messages_to_request(&[
            Message::system("s"),
            Message::user("u"),
            Message::assistant("a"),
        ]);
        assert_eq!(out.len(), 3);
        assert!(matches!(out[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(out[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(out[2], ChatCompletionRequestMessage::Assistant(_)));
    }

    #[test]
    fn builder_sets_model_and_temperature() {
        let llm = ChatOpenAI::from_credentials("sk-test", Some("http://localhost:1"), "m")
            .with_temperature(0.1);
        assert_eq!(llm.model(), "m");
        assert_eq!(llm.temperature, Some(0.1));
    }
}
