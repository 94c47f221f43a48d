//! HTTP transport for the HiAgent service.
//!
//! Core components:
//! - `HiAgentClient`: blocking client covering the six endpoints
//! - `SseDecoder` / `EventStream`: incremental decoding of the streaming
//!   chat response body
//! - `types`: per-endpoint wire payloads and responses

pub mod client;
pub mod stream;
pub mod types;

pub use client::{ChatTransport, EventIter, HiAgentClient};
pub use stream::{EventStream, SseDecoder, StreamOptions, DEFAULT_CHUNK_SIZE};
pub use types::{
    ChatAnswer, ConversationInfo, ConversationRecord, ResponseMode, StreamEvent, MESSAGE_EVENT,
};
