use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::debug;

use super::client::{ChatModel, TextIter, TextStream};
use super::config::{ClientConfig, DEFAULT_USER_ID};
use super::http::{ChatTransport, HiAgentClient, StreamOptions};
use super::types::{ChatMessage, ChatOptions, ModelResponse};
use crate::error::{HiAgentError, Result};

/// Chat provider backed by the HiAgent service.
///
/// A conversation is created lazily on the first chat call and reused for
/// the lifetime of the instance; the remote service carries the
/// conversational state, so `history` is accepted but never sent. Clones
/// share the same conversation.
///
/// The async methods submit the blocking call to the tokio blocking pool.
/// Dropping the returned future does not cancel the underlying HTTP call;
/// it runs to completion in the background.
#[derive(Clone)]
pub struct HiAgentChatModel {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn ChatTransport>,
    user_id: String,
    conversation_inputs: Map<String, Value>,
    // Held across the create call so concurrent first uses issue one create.
    conversation_ready: Mutex<bool>,
}

impl HiAgentChatModel {
    pub fn new(client: HiAgentClient) -> Self {
        Self::with_transport(Arc::new(client), DEFAULT_USER_ID, Map::new())
    }

    /// Build from an explicit transport, user id, and conversation inputs.
    pub fn with_transport(
        transport: Arc<dyn ChatTransport>,
        user_id: impl Into<String>,
        conversation_inputs: Map<String, Value>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                user_id: user_id.into(),
                conversation_inputs,
                conversation_ready: Mutex::new(false),
            }),
        }
    }

    /// Build from `HIAGENT_BASE_URL` and `HIAGENT_APIKEY`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(HiAgentClient::new(ClientConfig::from_env()?)?))
    }

    fn ensure_conversation(&self) -> Result<()> {
        let mut ready = self.inner.conversation_ready.lock();
        if !*ready {
            self.inner
                .transport
                .create_conversation(&self.inner.user_id, Some(&self.inner.conversation_inputs))?;
            *ready = true;
            debug!(user_id = %self.inner.user_id, "conversation ready");
        }
        Ok(())
    }

    fn stream_options(options: &ChatOptions) -> StreamOptions {
        match options.chunk_size {
            Some(chunk_size) => StreamOptions::default().with_chunk_size(chunk_size),
            None => StreamOptions::default(),
        }
    }
}

#[async_trait]
impl ChatModel for HiAgentChatModel {
    fn chat(
        &self,
        prompt: &str,
        _history: Option<&[ChatMessage]>,
        options: &ChatOptions,
    ) -> Result<ModelResponse> {
        self.ensure_conversation()?;
        let answer = self
            .inner
            .transport
            .chat_query_blocking(prompt, options.query_extends.as_ref())?;

        // Best effort: a non-JSON answer still succeeds as plain text.
        let parsed = if options.json_output {
            serde_json::from_str(&answer.answer).ok()
        } else {
            None
        };

        Ok(ModelResponse {
            content: answer.answer,
            parsed,
        })
    }

    fn chat_stream(
        &self,
        prompt: &str,
        _history: Option<&[ChatMessage]>,
        options: &ChatOptions,
    ) -> Result<TextIter> {
        self.ensure_conversation()?;
        let events = self.inner.transport.chat_query_streaming(
            prompt,
            options.query_extends.as_ref(),
            Self::stream_options(options),
        )?;

        // Only non-empty answer fragments from message events reach the caller.
        Ok(Box::new(events.filter_map(|event| match event {
            Ok(event) if event.is_message() && !event.answer.is_empty() => Some(Ok(event.answer)),
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        })))
    }

    async fn achat(
        &self,
        prompt: &str,
        history: Option<&[ChatMessage]>,
        options: &ChatOptions,
    ) -> Result<ModelResponse> {
        let this = self.clone();
        let prompt = prompt.to_string();
        let history = history.map(<[ChatMessage]>::to_vec);
        let options = options.clone();
        tokio::task::spawn_blocking(move || this.chat(&prompt, history.as_deref(), &options))
            .await
            .map_err(|err| HiAgentError::Other(anyhow::anyhow!("chat worker failed: {err}")))?
    }

    /// The event sequence is collected on the worker thread before being
    /// handed back; fragments are not forwarded incrementally across the
    /// thread boundary.
    async fn achat_stream(
        &self,
        prompt: &str,
        history: Option<&[ChatMessage]>,
        options: &ChatOptions,
    ) -> Result<TextStream> {
        let this = self.clone();
        let prompt = prompt.to_string();
        let history = history.map(<[ChatMessage]>::to_vec);
        let options = options.clone();
        let fragments = tokio::task::spawn_blocking(move || -> Result<Vec<Result<String>>> {
            Ok(this
                .chat_stream(&prompt, history.as_deref(), &options)?
                .collect())
        })
        .await
        .map_err(|err| HiAgentError::Other(anyhow::anyhow!("chat worker failed: {err}")))??;

        Ok(Box::pin(futures::stream::iter(fragments)))
    }
}
