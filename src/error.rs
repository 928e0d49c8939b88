//! Error taxonomy shared across the engine (§7 of the design).

use std::error::Error;
use std::fmt;

/// Top-level error type returned by fallible engine operations.
///
/// Kept as a small hand-rolled enum, matching the rest of the corpus's error types
/// rather than reaching for a derive-macro crate: there are only four kinds of
/// failure this engine distinguishes, and the propagation policy (§7) only ever
/// cares which kind it is, not a rich chain of causes.
#[derive(Debug)]
pub enum EngineError {
    /// Malformed or semantically invalid inbound message.
    Protocol(String),
    /// Missing or invalid server/debate configuration.
    Config(String),
    /// Failure reaching or iterating the upstream chat-completions API.
    Upstream(String),
    /// Transport-level I/O failure (bind, accept, socket write).
    Io(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Protocol(msg) => write!(f, "protocol error: {}", msg),
            EngineError::Config(msg) => write!(f, "configuration error: {}", msg),
            EngineError::Upstream(msg) => write!(f, "upstream error: {}", msg),
            EngineError::Io(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e.to_string())
    }
}

impl EngineError {
    /// The bare message, without the `"<kind> error: "` prefix `Display` adds —
    /// what callers building a client-facing `error` record actually want to send.
    pub fn message(&self) -> &str {
        match self {
            EngineError::Protocol(msg)
            | EngineError::Config(msg)
            | EngineError::Upstream(msg)
            | EngineError::Io(msg) => msg,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
