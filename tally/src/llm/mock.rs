//! Mock LLM for tests and examples.
//!
//! Replies come from a script consumed in call order, then from an optional fallback
//! reply; or, for order-independent tests, from a responder function of the prompt.
//! Every prompt is recorded so tests can assert what the nodes asked.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;

type Responder = Arc<dyn Fn(&str) -> Result<String, String> + Send + Sync>;

/// Mock LLM: scripted replies or failures.
///
/// **Interaction**: Implements `LlmClient`; used by the analysis nodes in tests.
pub struct MockLlm {
    /// Replies consumed in call order; `Err` is returned as `AgentError::ExecutionFailed`.
    script: Mutex<VecDeque<Result<String, String>>>,
    /// Reply once the script is exhausted. When `None`, an exhausted script is an error.
    fallback: Option<String>,
    /// When set, replies are computed from the prompt instead of the script.
    responder: Option<Responder>,
    /// Artificial latency per call (for deadline tests).
    delay: Option<Duration>,
    call_count: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    fn empty() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            responder: None,
            delay: None,
            call_count: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock that always returns `content`.
    pub fn with_reply(content: impl Into<String>) -> Self {
        Self {
            fallback: Some(content.into()),
            ..Self::empty()
        }
    }

    /// Creates a mock with an empty script; add replies with `then_reply` / `then_fail`.
    pub fn scripted() -> Self {
        Self::empty()
    }

    /// Creates a mock whose reply is computed from the prompt text.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, String> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Arc::new(responder)),
            ..Self::empty()
        }
    }

    /// Appends a successful reply to the script (builder).
    pub fn then_reply(self, content: impl Into<String>) -> Self {
        self.push(Ok(content.into()));
        self
    }

    /// Appends a failure to the script (builder).
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()));
        self
    }

    /// Sets the reply used after the script is exhausted (builder).
    pub fn otherwise_reply(mut self, content: impl Into<String>) -> Self {
        self.fallback = Some(content.into());
        self
    }

    /// Sleeps for `delay` before every reply (builder).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `invoke` calls so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far (text of the last message of each call).
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn push(&self, reply: Result<String, String>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    fn next_reply(&self, prompt: &str) -> Result<String, String> {
        if let Some(responder) = &self.responder {
            return responder(prompt);
        }
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match (scripted, &self.fallback) {
            (Some(reply), _) => reply,
            (None, Some(fallback)) => Ok(fallback.clone()),
            (None, None) => Err("mock script exhausted".to_string()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let prompt = messages
            .last()
            .map(|m| m.content().to_string())
            .unwrap_or_default();
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.next_reply(&prompt)
            .map(|content| LlmResponse {
                content,
                usage: None,
            })
            .map_err(AgentError::ExecutionFailed)
    }
}
