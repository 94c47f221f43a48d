use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event kind carried by answer-fragment frames.
pub const MESSAGE_EVENT: &str = "message";

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    Blocking,
    Streaming,
}

#[derive(Serialize)]
pub(crate) struct CreateConversationPayload<'a> {
    #[serde(rename = "AppKey")]
    pub app_key: &'a str,
    #[serde(rename = "Inputs")]
    pub inputs: &'a Map<String, Value>,
    #[serde(rename = "UserID")]
    pub user_id: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ChatQueryPayload<'a> {
    #[serde(rename = "Query")]
    pub query: &'a str,
    #[serde(rename = "AppConversationID")]
    pub app_conversation_id: &'a str,
    #[serde(rename = "AppKey")]
    pub app_key: &'a str,
    #[serde(rename = "ResponseMode")]
    pub response_mode: ResponseMode,
    #[serde(rename = "UserID")]
    pub user_id: &'a str,
    #[serde(rename = "QueryExtends")]
    pub query_extends: Option<&'a Value>,
}

#[derive(Serialize)]
pub(crate) struct ConversationMessagesPayload<'a> {
    #[serde(rename = "AppKey")]
    pub app_key: &'a str,
    #[serde(rename = "UserID")]
    pub user_id: &'a str,
    #[serde(rename = "AppConversationID")]
    pub app_conversation_id: &'a str,
    #[serde(rename = "Limit")]
    pub limit: u32,
}

#[derive(Serialize)]
pub(crate) struct MessageInfoPayload<'a> {
    #[serde(rename = "AppKey")]
    pub app_key: &'a str,
    #[serde(rename = "UserID")]
    pub user_id: &'a str,
    #[serde(rename = "MessageID")]
    pub message_id: &'a str,
}

#[derive(Serialize)]
pub(crate) struct WorkflowPayload<'a> {
    #[serde(rename = "AppKey")]
    pub app_key: &'a str,
    #[serde(rename = "UserID")]
    pub user_id: &'a str,
    #[serde(rename = "Input")]
    pub input: &'a Value,
    #[serde(rename = "AppID")]
    pub app_id: &'a str,
}

/// Body returned by `create_conversation`.
#[derive(Clone, Debug, Deserialize)]
pub struct ConversationRecord {
    #[serde(rename = "Conversation")]
    pub conversation: ConversationInfo,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConversationInfo {
    #[serde(rename = "AppConversationID")]
    pub app_conversation_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of a blocking chat response. An absent `answer` field yields an
/// empty string rather than a failure.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatAnswer {
    #[serde(default)]
    pub answer: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One decoded `data:`-framed event from a streaming chat response.
#[derive(Clone, Debug, Deserialize)]
pub struct StreamEvent {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub answer: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StreamEvent {
    pub fn is_message(&self) -> bool {
        self.event == MESSAGE_EVENT
    }
}
