//! Error types for the Savor gateway

use thiserror::Error;

/// Result type alias for Savor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Savor gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech capability missing in the host environment.
    ///
    /// Terminal for the session: shown once, voice features stay disabled.
    #[error("speech capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Per-session recognition failure; the session returns to idle and the
    /// user may retry
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Speech synthesis failure. Swallowed (log only) at the controller;
    /// audio confirmation is best-effort.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Backend request failure: non-2xx status or transport error
    #[error("backend error{}: {message}", status.map_or_else(String::new, |s| format!(" ({s})")))]
    Backend {
        /// HTTP status code, when a response was received at all
        status: Option<u16>,
        /// Human-readable failure description
        message: String,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Build a backend error from a received HTTP status and response body
    #[must_use]
    pub fn backend_status(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Build a backend error for a transport-level failure (no response)
    #[must_use]
    pub fn backend_transport(message: impl Into<String>) -> Self {
        Self::Backend {
            status: None,
            message: message.into(),
        }
    }
}
