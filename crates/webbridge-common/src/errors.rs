use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// A wire string that could not be turned into an envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("envelope is not a JSON object")]
    NotAnObject,

    #[error("envelope has no string `type` field")]
    MissingType,

    #[error("envelope `type` is empty")]
    EmptyType,
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("channel unavailable: session is {state}")]
    ChannelUnavailable { state: &'static str },

    #[error("duplicate request id: {0}")]
    DuplicateRequestId(String),

    /// A request whose payload cannot carry a `requestId`.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}
