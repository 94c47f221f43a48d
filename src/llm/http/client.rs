use parking_lot::Mutex;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, CONNECTION, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::stream::{EventStream, StreamOptions};
use super::types::{
    ChatAnswer, ChatQueryPayload, ConversationMessagesPayload, ConversationRecord,
    CreateConversationPayload, MessageInfoPayload, ResponseMode, StreamEvent, WorkflowPayload,
};
use crate::error::{HiAgentError, Result};
use crate::llm::config::ClientConfig;

const CREATE_CONVERSATION_PATH: &str = "/api/proxy/api/v1/create_conversation";
const CHAT_QUERY_PATH: &str = "/api/proxy/api/v1/chat_query_v2";
const CONVERSATION_MESSAGES_PATH: &str = "/api/proxy/api/v1/get_conversation_messages";
const MESSAGE_INFO_PATH: &str = "/api/proxy/api/v1/get_message_info";
const RUN_APP_WORKFLOW_PATH: &str = "/api/proxy/api/v1/run_app_workflow";
const QUERY_RUN_APP_PROCESS_PATH: &str = "/api/proxy/api/v1/query_run_app_process";

pub type EventIter = Box<dyn Iterator<Item = Result<StreamEvent>> + Send>;

/// Transport seam between the chat façade and the HiAgent wire protocol.
///
/// Implementors encapsulate endpoint paths, payload shapes, and HTTP
/// concerns so the façade stays decoupled from them.
pub trait ChatTransport: Send + Sync {
    /// Create a remote conversation and remember its identifier for
    /// subsequent chat calls.
    fn create_conversation(
        &self,
        user_id: &str,
        inputs: Option<&Map<String, Value>>,
    ) -> Result<ConversationRecord>;

    /// Single blocking chat query; returns the parsed response body.
    fn chat_query_blocking(&self, query: &str, query_extends: Option<&Value>)
        -> Result<ChatAnswer>;

    /// Streaming chat query; returns a finite, single-pass event sequence.
    fn chat_query_streaming(
        &self,
        query: &str,
        query_extends: Option<&Value>,
        options: StreamOptions,
    ) -> Result<EventIter>;
}

#[derive(Default)]
struct SessionState {
    conversation_id: Option<String>,
    user_id: Option<String>,
}

/// Blocking HTTP client for the HiAgent endpoints.
///
/// Owns one HTTP session reused across calls; the conversation identifier
/// and user id are captured by [`create_conversation`](Self::create_conversation)
/// and reused by every chat-related call afterwards. Transport failures and
/// non-2xx statuses are logged and propagated unchanged; there is no retry.
pub struct HiAgentClient {
    http: Client,
    config: ClientConfig,
    api_key: String,
    session: Mutex<SessionState>,
}

impl HiAgentClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "Apikey",
            HeaderValue::from_str(&api_key)
                .map_err(|_| HiAgentError::Config("API key is not a valid header value".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|_| {
                HiAgentError::Config("user agent is not a valid header value".into())
            })?,
        );

        let http = Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            api_key,
            session: Mutex::new(SessionState::default()),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Identifier of the active conversation, if one has been created.
    pub fn conversation_id(&self) -> Option<String> {
        self.session.lock().conversation_id.clone()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn session_ids(&self) -> Result<(String, String)> {
        let session = self.session.lock();
        match (&session.conversation_id, &session.user_id) {
            (Some(conversation_id), Some(user_id)) => {
                Ok((conversation_id.clone(), user_id.clone()))
            }
            _ => Err(HiAgentError::ConversationNotReady),
        }
    }

    fn session_user(&self) -> Result<String> {
        self.session
            .lock()
            .user_id
            .clone()
            .ok_or(HiAgentError::ConversationNotReady)
    }

    /// POST a JSON payload and fail on transport errors or non-2xx statuses.
    /// `timeout: None` leaves the request unbounded.
    fn post_json<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let url = self.endpoint(path);
        let mut request = self.http.post(&url).json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().map_err(|err| {
            error!(url = %url, error = %err, "request failed");
            HiAgentError::Http(err)
        })?;
        response.error_for_status().map_err(|err| {
            error!(url = %url, error = %err, "request returned error status");
            HiAgentError::Http(err)
        })
    }

    fn parse_body<T: serde::de::DeserializeOwned>(path: &str, response: Response) -> Result<T> {
        response.json().map_err(|err| {
            error!(path = %path, error = %err, "malformed response body");
            HiAgentError::Http(err)
        })
    }

    #[instrument(skip(self, inputs))]
    pub fn create_conversation(
        &self,
        user_id: &str,
        inputs: Option<&Map<String, Value>>,
    ) -> Result<ConversationRecord> {
        let empty = Map::new();
        let payload = CreateConversationPayload {
            app_key: &self.api_key,
            inputs: inputs.unwrap_or(&empty),
            user_id,
        };
        let response = self.post_json(
            CREATE_CONVERSATION_PATH,
            &payload,
            Some(self.config.metadata_timeout),
        )?;
        let record: ConversationRecord = Self::parse_body(CREATE_CONVERSATION_PATH, response)?;

        let mut session = self.session.lock();
        session.conversation_id = Some(record.conversation.app_conversation_id.clone());
        session.user_id = Some(user_id.to_string());
        debug!(conversation_id = %record.conversation.app_conversation_id, "conversation created");
        Ok(record)
    }

    #[instrument(skip(self, query, query_extends), fields(query_len = query.len()))]
    pub fn chat_query_blocking(
        &self,
        query: &str,
        query_extends: Option<&Value>,
    ) -> Result<ChatAnswer> {
        let (conversation_id, user_id) = self.session_ids()?;
        let payload = ChatQueryPayload {
            query,
            app_conversation_id: &conversation_id,
            app_key: &self.api_key,
            response_mode: ResponseMode::Blocking,
            user_id: &user_id,
            query_extends,
        };
        // Deliberately unbounded: blocking generation can outlast any fixed budget.
        let response = self.post_json(CHAT_QUERY_PATH, &payload, None)?;
        Self::parse_body(CHAT_QUERY_PATH, response)
    }

    #[instrument(skip(self, query, query_extends, options), fields(query_len = query.len()))]
    pub fn chat_query_streaming(
        &self,
        query: &str,
        query_extends: Option<&Value>,
        options: StreamOptions,
    ) -> Result<EventStream> {
        let (conversation_id, user_id) = self.session_ids()?;
        let payload = ChatQueryPayload {
            query,
            app_conversation_id: &conversation_id,
            app_key: &self.api_key,
            response_mode: ResponseMode::Streaming,
            user_id: &user_id,
            query_extends,
        };
        let url = self.endpoint(CHAT_QUERY_PATH);
        let response = self
            .http
            .post(&url)
            .header(CONNECTION, "keep-alive")
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .timeout(self.config.stream_timeout)
            .json(&payload)
            .send()
            .map_err(|err| {
                error!(url = %url, error = %err, "streaming request failed");
                HiAgentError::Http(err)
            })?
            .error_for_status()
            .map_err(|err| {
                error!(url = %url, error = %err, "streaming request returned error status");
                HiAgentError::Http(err)
            })?;
        Ok(EventStream::new(response, options))
    }

    #[instrument(skip(self))]
    pub fn get_conversation_messages(&self, limit: u32) -> Result<Value> {
        let (conversation_id, user_id) = self.session_ids()?;
        let payload = ConversationMessagesPayload {
            app_key: &self.api_key,
            user_id: &user_id,
            app_conversation_id: &conversation_id,
            limit,
        };
        let response = self.post_json(
            CONVERSATION_MESSAGES_PATH,
            &payload,
            Some(self.config.metadata_timeout),
        )?;
        Self::parse_body(CONVERSATION_MESSAGES_PATH, response)
    }

    #[instrument(skip(self))]
    pub fn get_message_info(&self, message_id: &str) -> Result<Value> {
        let user_id = self.session_user()?;
        let payload = MessageInfoPayload {
            app_key: &self.api_key,
            user_id: &user_id,
            message_id,
        };
        let response = self.post_json(
            MESSAGE_INFO_PATH,
            &payload,
            Some(self.config.metadata_timeout),
        )?;
        Self::parse_body(MESSAGE_INFO_PATH, response)
    }

    #[instrument(skip(self, input))]
    pub fn run_app_workflow(&self, input: &Value, app_id: &str) -> Result<Value> {
        let user_id = self.session_user()?;
        let payload = WorkflowPayload {
            app_key: &self.api_key,
            user_id: &user_id,
            input,
            app_id,
        };
        let response = self.post_json(
            RUN_APP_WORKFLOW_PATH,
            &payload,
            Some(self.config.metadata_timeout),
        )?;
        Self::parse_body(RUN_APP_WORKFLOW_PATH, response)
    }

    #[instrument(skip(self, input))]
    pub fn query_run_app_process(&self, input: &Value, app_id: &str) -> Result<Value> {
        let user_id = self.session_user()?;
        let payload = WorkflowPayload {
            app_key: &self.api_key,
            user_id: &user_id,
            input,
            app_id,
        };
        let response = self.post_json(
            QUERY_RUN_APP_PROCESS_PATH,
            &payload,
            Some(self.config.metadata_timeout),
        )?;
        Self::parse_body(QUERY_RUN_APP_PROCESS_PATH, response)
    }
}

impl ChatTransport for HiAgentClient {
    fn create_conversation(
        &self,
        user_id: &str,
        inputs: Option<&Map<String, Value>>,
    ) -> Result<ConversationRecord> {
        HiAgentClient::create_conversation(self, user_id, inputs)
    }

    fn chat_query_blocking(
        &self,
        query: &str,
        query_extends: Option<&Value>,
    ) -> Result<ChatAnswer> {
        HiAgentClient::chat_query_blocking(self, query, query_extends)
    }

    fn chat_query_streaming(
        &self,
        query: &str,
        query_extends: Option<&Value>,
        options: StreamOptions,
    ) -> Result<EventIter> {
        let stream = HiAgentClient::chat_query_streaming(self, query, query_extends, options)?;
        Ok(Box::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> HiAgentClient {
        HiAgentClient::new(ClientConfig::new("https://agent.example.com/", "sk-test")).unwrap()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = test_client();
        assert_eq!(
            client.endpoint(CHAT_QUERY_PATH),
            "https://agent.example.com/api/proxy/api/v1/chat_query_v2"
        );
    }

    #[test]
    fn test_chat_before_create_conversation_fails() {
        let client = test_client();
        let result = client.chat_query_blocking("hello", None);
        assert!(matches!(result, Err(HiAgentError::ConversationNotReady)));
        let result = client.get_conversation_messages(10);
        assert!(matches!(result, Err(HiAgentError::ConversationNotReady)));
        assert!(client.conversation_id().is_none());
    }
}
