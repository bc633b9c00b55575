//! Face tracking support
//!
//! This module provides the tracking session state machine, the face
//! anchors it publishes, and the overlay node that follows them.

pub mod ar_session;
pub mod face_overlay;
pub mod spatial_anchor;

pub use ar_session::{
    FaceTrackingProvider, RunOptions, SensorEvent, SensorEventSender, SessionEvent, SessionObserver,
    TrackingSessionManager, TrackingSessionState,
};
pub use face_overlay::{FaceOverlay, FaceOverlayNode};
pub use spatial_anchor::{AnchorId, FaceAnchor, MeshSample};
