//! Error types
//!
//! The crate-level [`Error`] wraps the component errors. Most of them never
//! reach a caller: malformed inbound messages are dropped, pipeline failures
//! are logged and leave the session idle. Only binding the listener and
//! running the server surface errors to the embedding application.

use std::fmt;

use tokio_tungstenite::tungstenite;

/// Crate-level result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Socket level failure (bind, accept, thread spawn)
    Io(std::io::Error),
    /// WebSocket handshake or framing failure
    WebSocket(tungstenite::Error),
    /// Media pipeline failure
    Pipeline(PipelineError),
    /// Invalid configuration
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::WebSocket(e) => write!(f, "WebSocket error: {}", e),
            Error::Pipeline(e) => write!(f, "Pipeline error: {}", e),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::WebSocket(e) => Some(e),
            Error::Pipeline(e) => Some(e),
            Error::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<tungstenite::Error> for Error {
    fn from(e: tungstenite::Error) -> Self {
        Error::WebSocket(e)
    }
}

impl From<PipelineError> for Error {
    fn from(e: PipelineError) -> Self {
        Error::Pipeline(e)
    }
}

/// Failures reported by a [`MediaPipeline`](crate::media::MediaPipeline)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The pipeline could not be built or could not enter its active state
    Allocation(String),
    /// The remote offer could not be parsed or applied
    InvalidOffer(String),
    /// The pipeline could not produce a local answer
    Negotiation(String),
    /// A running pipeline failed on its own (bus error, lost device)
    Failed(String),
    /// A running pipeline reached end of stream
    EndOfStream,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Allocation(msg) => write!(f, "allocation failed: {}", msg),
            PipelineError::InvalidOffer(msg) => write!(f, "invalid offer: {}", msg),
            PipelineError::Negotiation(msg) => write!(f, "negotiation failed: {}", msg),
            PipelineError::Failed(msg) => write!(f, "pipeline failed: {}", msg),
            PipelineError::EndOfStream => write!(f, "end of stream"),
        }
    }
}

impl std::error::Error for PipelineError {}

/// Result of feeding one frame into the pipeline's ingestion point
///
/// Every variant is fatal to the producing loop; a broken sink does not
/// recover by being fed again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The sink is flushing or shutting down
    Flushing,
    /// The sink has reached end of stream
    Eos,
    /// The ingestion point is not linked to anything downstream
    NotLinked,
    /// Any other downstream failure
    Error(String),
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::Flushing => write!(f, "flushing"),
            FlowError::Eos => write!(f, "end of stream"),
            FlowError::NotLinked => write!(f, "not linked"),
            FlowError::Error(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FlowError {}

/// Inbound wire message could not be decoded
#[derive(Debug)]
pub enum MessageError {
    /// Not a JSON object, unknown `type`, or a required field is missing
    Malformed(serde_json::Error),
    /// Binary frame that is not valid UTF-8
    NotText,
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::Malformed(e) => write!(f, "malformed message: {}", e),
            MessageError::NotText => write!(f, "message is not UTF-8 text"),
        }
    }
}

impl std::error::Error for MessageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MessageError::Malformed(e) => Some(e),
            MessageError::NotText => None,
        }
    }
}

impl From<serde_json::Error> for MessageError {
    fn from(e: serde_json::Error) -> Self {
        MessageError::Malformed(e)
    }
}
