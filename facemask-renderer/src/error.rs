//! Error types for face tracking and overlay rendering

use crate::ar::AnchorId;
use thiserror::Error;

/// Type alias for session results
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors surfaced by the tracking session and the overlay
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The device cannot provide face tracking
    #[error("Face tracking is not supported on this device")]
    UnsupportedCapability,

    /// The sensor session is interrupted; recovers on its own
    #[error("Tracking session was interrupted")]
    SensorInterrupted,

    /// The sensor session failed and needs an explicit reset
    #[error("Tracking session failed: {reason}")]
    SensorFailed {
        /// Reason reported by the tracking provider
        reason: String,
    },

    /// An update referenced an anchor with no attached overlay
    #[error("No overlay attached for anchor {anchor}")]
    GeometryMismatch {
        /// Anchor named by the stray update
        anchor: AnchorId,
    },

    /// Mesh payload is not a valid triangle mesh
    #[error("Invalid mesh sample: {0}")]
    InvalidMeshSample(String),

    /// Tracking configuration asks for something this core cannot do
    #[error("Invalid tracking configuration: {0}")]
    InvalidConfiguration(String),

    /// Renderer configuration could not be parsed or is out of range
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SessionError {
    /// Whether the session recovers from this error without a reset
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::SensorInterrupted)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(error: serde_json::Error) -> Self {
        SessionError::Config(error.to_string())
    }
}
