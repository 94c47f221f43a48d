pub mod config;
pub mod error;
pub mod llm;
pub mod utils;

pub use config::EnvConfig;
pub use error::{HiAgentError, Result};
pub use llm::http::{
    ChatAnswer, ChatTransport, ConversationInfo, ConversationRecord, EventIter, EventStream,
    HiAgentClient, SseDecoder, StreamEvent, StreamOptions,
};
pub use llm::{
    ChatMessage, ChatModel, ChatOptions, ClientConfig, HiAgentChatModel, ModelResponse, TextIter,
    TextStream,
};
pub use utils::LoggingConfig;
