pub mod client;
pub mod config;
pub mod hiagent;
pub mod http;
pub mod types;

pub use client::{ChatModel, TextIter, TextStream};
pub use config::{ClientConfig, DEFAULT_USER_AGENT, DEFAULT_USER_ID};
pub use hiagent::HiAgentChatModel;
pub use types::{ChatMessage, ChatOptions, ModelResponse};
