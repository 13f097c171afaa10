//! Error types for tsdbwire
//!
//! Provides a unified error type for all client operations.

use thiserror::Error;

/// Result type alias using WireError
pub type Result<T> = std::result::Result<T, WireError>;

/// Unified error type for tsdbwire operations
#[derive(Debug, Error)]
pub enum WireError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{op} timed out after {after_ms} ms")]
    Timeout { op: &'static str, after_ms: u64 },

    #[error("Connection unusable: {0}")]
    Disconnected(String),

    // -------------------------------------------------------------------------
    // Wire Format Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    // -------------------------------------------------------------------------
    // Server-Reported Errors
    // -------------------------------------------------------------------------
    /// Non-zero status byte; the connection stays usable.
    #[error("{command} error: {message}")]
    Server {
        command: &'static str,
        message: String,
    },

    #[error("handshake failed at {step}: {message}")]
    Handshake {
        step: &'static str,
        message: String,
    },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WireError {
    /// Whether the connection must be discarded after this error.
    ///
    /// Transport and framing failures may leave a half-read frame on the
    /// stream, so nothing read afterwards can be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WireError::Io(_)
                | WireError::Timeout { .. }
                | WireError::Protocol(_)
                | WireError::Disconnected(_)
                | WireError::Handshake { .. }
        )
    }

    /// The server's message for a server-reported failure.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            WireError::Server { message, .. } | WireError::Handshake { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }

    pub(crate) fn truncated(what: &str, needed: usize, available: usize) -> Self {
        WireError::Protocol(format!(
            "truncated {}: need {} bytes, {} available",
            what, needed, available
        ))
    }
}
