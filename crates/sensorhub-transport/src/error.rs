use std::path::PathBuf;

/// Errors that can occur while moving transfers between the hub and the host.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the capture file or device node.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A transfer exceeds the configured maximum size.
    #[error("transfer too large ({size} bytes, max {max})")]
    TransferTooLarge { size: usize, max: usize },

    /// The stream ended before a complete transfer was received.
    #[error("connection closed (incomplete transfer)")]
    ConnectionClosed,

    /// The hub did not deliver a transfer within the read timeout.
    #[error("timed out waiting for hub transfer")]
    Timeout,
}

impl TransportError {
    /// Returns true when the error means the hub stopped answering, which the
    /// recovery path counts towards escalation.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
