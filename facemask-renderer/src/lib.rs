//! Facemask Renderer - face mesh overlay for live face tracking
//!
//! This crate keeps a renderable mask glued to a tracked face: it runs the
//! tracking session state machine, mirrors the face mesh into the scene every
//! frame, swaps between the mask presets, and drives scene lighting from the
//! tracker's ambient light estimate.

#![warn(missing_docs)]

pub mod ar;
pub mod config;
pub mod error;
pub mod primitives;
pub mod renderer;
pub mod three_d;

pub use ar::{FaceAnchor, FaceOverlay, FaceTrackingProvider, SessionEvent, TrackingSessionManager, TrackingSessionState};
pub use config::{FaceTrackingConfig, RendererConfig};
pub use error::{Result, SessionError};
pub use primitives::Color;
pub use renderer::{FaceTrackingRenderer, FrameReport};
pub use three_d::{FaceGeometry, LightEstimate, MaterialPreset, Scene3D, SceneGraph};
