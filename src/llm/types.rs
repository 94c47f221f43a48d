use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Per-call options for [`ChatModel`](super::ChatModel) methods.
#[derive(Clone, Debug, Default)]
pub struct ChatOptions {
    /// Extra parameters forwarded verbatim as `QueryExtends`.
    pub query_extends: Option<Value>,
    /// Attempt a best-effort JSON parse of the final answer text. A
    /// non-JSON answer still succeeds, with only plain text populated.
    pub json_output: bool,
    /// Read size for the streaming response body. `None` keeps the decoder
    /// default.
    pub chunk_size: Option<usize>,
}

impl ChatOptions {
    pub fn with_query_extends(mut self, query_extends: Value) -> Self {
        self.query_extends = Some(query_extends);
        self
    }

    pub fn with_json_output(mut self, json_output: bool) -> Self {
        self.json_output = json_output;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }
}

/// Final result of a blocking chat call, in the shape the host framework
/// consumes: answer text plus an optional parsed-JSON value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelResponse {
    pub content: String,
    /// Present only when JSON output was requested and the answer parsed.
    #[serde(default)]
    pub parsed: Option<Value>,
}
