use std::path::PathBuf;

/// Errors from one recovery attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecoveryError {
    /// Re-initialization of the hub failed. Nothing is replayed.
    #[error("hub re-initialization failed: {0}")]
    InitFailed(String),

    /// A command to the hub was not acknowledged.
    #[error("command {code:#04x} failed: {reason}")]
    Command { code: u8, reason: String },

    /// The recovery task ended without reporting an outcome.
    #[error("recovery aborted: {0}")]
    Aborted(String),
}

/// Errors surfaced by the runtime layer.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] sensorhub_frame::FrameError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] sensorhub_transport::TransportError),

    /// Recovery error.
    #[error("recovery error: {0}")]
    Recovery(#[from] RecoveryError),

    /// A bulk job handler reported failure.
    #[error("{kind} job failed: {reason}")]
    Job { kind: &'static str, reason: String },

    /// Configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration JSON is invalid.
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    /// No tokio runtime is available to run jobs on.
    #[error("no tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
