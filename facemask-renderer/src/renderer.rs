//! Render-thread driver for the face overlay
//!
//! [`FaceTrackingRenderer`] is ticked once per display frame. Each tick drains
//! the session's event queue, lets the overlay follow the anchor lifecycle and
//! feeds the frame's light estimate into the scene lighting.

use crate::ar::{FaceOverlay, FaceTrackingProvider, SessionObserver, TrackingSessionManager, TrackingSessionState};
use crate::config::RendererConfig;
use crate::error::{Result, SessionError};
use crate::three_d::{LightingFeedbackController, MaterialPreset, Scene3D, SceneGraph};
use log::info;

/// Outcome of one frame tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Session events handled this frame
    pub events: usize,
    /// Lighting intensity written this frame, if an estimate arrived
    pub lighting_intensity: Option<f32>,
}

/// Owns the session, the overlay and the scene they write into
pub struct FaceTrackingRenderer<S: SceneGraph = Scene3D> {
    session: TrackingSessionManager,
    scene: S,
    overlay: FaceOverlay,
    lighting: LightingFeedbackController,
    config: RendererConfig,
    frame_count: u64,
    last_timestamp: Option<f64>,
}

impl FaceTrackingRenderer<Scene3D> {
    /// Create a renderer with an in-memory scene
    pub fn new(provider: Box<dyn FaceTrackingProvider>, config: RendererConfig) -> Result<Self> {
        Self::with_scene(provider, Scene3D::new("face-tracking"), config)
    }
}

impl<S: SceneGraph> FaceTrackingRenderer<S> {
    /// Create a renderer drawing into `scene`
    pub fn with_scene(provider: Box<dyn FaceTrackingProvider>, mut scene: S, config: RendererConfig) -> Result<Self> {
        config.validate()?;
        scene.set_lighting_intensity(config.initial_lighting_intensity);

        Ok(Self {
            session: TrackingSessionManager::with_config(provider, config.tracking),
            overlay: FaceOverlay::new(config.preset_store(), config.initial_preset),
            lighting: LightingFeedbackController::new(config.reference_intensity),
            scene,
            config,
            frame_count: 0,
            last_timestamp: None,
        })
    }

    /// Start tracking. Fails with `UnsupportedCapability` on devices
    /// without face tracking, in which case no overlay will ever attach.
    pub fn start(&mut self) -> Result<()> {
        self.session.start(self.config.tracking)
    }

    /// Re-arm tracking, discarding the current face
    pub fn reset(&mut self) -> Result<()> {
        self.session.reset()
    }

    /// Stop tracking and take the overlay out of the scene
    pub fn stop(&mut self) {
        self.session.stop();
        self.overlay.detach(&mut self.scene);
    }

    /// Per-frame hook, called by the display loop
    pub fn tick(&mut self, timestamp: f64) -> FrameReport {
        let events = self.session.pump();
        for event in &events {
            self.overlay.handle_event(&mut self.scene, event);
        }

        let estimate = self.session.take_light_estimate();
        let lighting_intensity = self.lighting.on_frame(&mut self.scene, estimate.as_ref());

        self.frame_count += 1;
        self.last_timestamp = Some(timestamp);

        FrameReport {
            events: events.len(),
            lighting_intensity,
        }
    }

    /// Switch to the other preset, re-arming tracking if configured to
    pub fn toggle_material_preset(&mut self) -> Result<MaterialPreset> {
        let next = self.overlay.active_preset().toggled();
        self.set_preset(next);

        if self.config.reset_on_preset_toggle && self.session.state() != TrackingSessionState::Idle {
            self.session.reset()?;
        }
        Ok(next)
    }

    /// Show `preset` on the overlay
    pub fn set_preset(&mut self, preset: MaterialPreset) {
        info!("Switching overlay to {} preset", preset);
        self.overlay.set_preset(&mut self.scene, preset);
    }

    /// Register a host observer for session events
    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) {
        self.session.subscribe(observer);
    }

    /// Current session state
    pub fn session_state(&self) -> TrackingSessionState {
        self.session.state()
    }

    /// Active preset
    pub fn active_preset(&self) -> MaterialPreset {
        self.overlay.active_preset()
    }

    /// Last error surfaced by the session
    pub fn last_error(&self) -> Option<&SessionError> {
        self.session.last_error()
    }

    /// The overlay
    pub fn overlay(&self) -> &FaceOverlay {
        &self.overlay
    }

    /// The scene
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// The session
    pub fn session(&self) -> &TrackingSessionManager {
        &self.session
    }

    /// Frames ticked so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Timestamp of the latest tick
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }
}
