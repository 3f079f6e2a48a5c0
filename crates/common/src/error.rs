//! Error types for the hospital coordinator.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MedcoordError {
    /// Transport, HTTP status or decoding failure talking to the model.
    #[error("LLM error: {0}")]
    Llm(String),

    /// The model asked for more than one tool in a single decision.
    #[error("Model requested {0} tool calls; at most one is allowed")]
    MultipleToolCalls(usize),

    #[error("A request is already in progress")]
    SessionBusy,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl MedcoordError {
    /// Stable machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Llm(_) => "llm_error",
            Self::MultipleToolCalls(_) => "multiple_tool_calls",
            Self::SessionBusy => "session_busy",
            Self::EmptyMessage => "empty_message",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Serialization(_) => "serialization_error",
            Self::Toml(_) => "toml_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, MedcoordError>;
