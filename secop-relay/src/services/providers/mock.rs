//! Mock provider implementation for testing.

use super::{ChatMessage, ChatParams, ChatProvider, ChatResponse, FinishReason, ProviderError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

enum Script {
    Reply(Option<String>),
    Fail(String),
}

/// Chat provider that returns a fixed outcome and records what it was sent.
pub struct MockChatProvider {
    script: Script,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<ChatMessage>>,
    last_params: Mutex<Option<ChatParams>>,
}

impl MockChatProvider {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
            last_params: Mutex::new(None),
        }
    }

    /// Always reply with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_script(Script::Reply(Some(text.into())))
    }

    /// Reply successfully but without any message content.
    pub fn without_content() -> Self {
        Self::with_script(Script::Reply(None))
    }

    /// Always fail with a network error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_script(Script::Fail(message.into()))
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn last_params(&self) -> Option<ChatParams> {
        self.last_params.lock().ok().and_then(|params| params.clone())
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &ChatParams,
    ) -> Result<ChatResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages.to_vec();
        }
        if let Ok(mut last) = self.last_params.lock() {
            *last = Some(params.clone());
        }

        match &self.script {
            Script::Reply(content) => Ok(ChatResponse {
                content: content.clone(),
                input_tokens: messages.iter().map(|m| m.content.len() as u32 / 4).sum(),
                output_tokens: content.as_ref().map_or(0, |c| c.len() as u32 / 4),
                finish_reason: FinishReason::Complete,
            }),
            Script::Fail(message) => Err(ProviderError::NetworkError(message.clone())),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
