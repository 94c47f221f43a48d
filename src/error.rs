use thiserror::Error;

pub type Result<T> = std::result::Result<T, HiAgentError>;

#[derive(Debug, Error)]
pub enum HiAgentError {
    #[error("conversation has not been created yet")]
    ConversationNotReady,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("stream read error: {0}")]
    Stream(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
