use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use super::types::{ChatMessage, ChatOptions, ModelResponse};
use crate::error::Result;

pub type TextIter = Box<dyn Iterator<Item = Result<String>> + Send>;
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Model-provider interface expected by the host framework.
///
/// `history` is accepted for interface compatibility but implementations may
/// ignore it when conversational state lives on the remote side.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Blocking chat call returning the full answer.
    fn chat(
        &self,
        prompt: &str,
        history: Option<&[ChatMessage]>,
        options: &ChatOptions,
    ) -> Result<ModelResponse>;

    /// Blocking call yielding answer fragments as they arrive.
    fn chat_stream(
        &self,
        prompt: &str,
        history: Option<&[ChatMessage]>,
        options: &ChatOptions,
    ) -> Result<TextIter>;

    /// Async variant of [`chat`](Self::chat).
    async fn achat(
        &self,
        prompt: &str,
        history: Option<&[ChatMessage]>,
        options: &ChatOptions,
    ) -> Result<ModelResponse>;

    /// Async variant of [`chat_stream`](Self::chat_stream).
    async fn achat_stream(
        &self,
        prompt: &str,
        history: Option<&[ChatMessage]>,
        options: &ChatOptions,
    ) -> Result<TextStream>;
}
