use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefineError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("AI provider is not configured")]
    NotConfigured,

    #[error("build LLM: {0}")]
    Build(String),

    #[error("chat: {0}")]
    Chat(String),

    #[error("LLM returned empty text")]
    EmptyResponse,

    #[error("LLM returned no text")]
    NoText,

    #[error("no JSON object in LLM output")]
    NoJson,

    #[error("malformed summary: {0}")]
    Malformed(#[from] serde_json::Error),
}
