//! Scene lighting driven by the tracker's ambient light estimate

use crate::three_d::SceneGraph;
use log::warn;
use serde::{Deserialize, Serialize};

/// Ambient intensity (lumens) that maps to a scene intensity of 1.0
pub const DEFAULT_REFERENCE_INTENSITY: f32 = 1000.0;

/// Ambient light estimate for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightEstimate {
    /// Estimated ambient intensity in lumens (~1000 for a well lit room)
    pub ambient_intensity: f32,
}

impl LightEstimate {
    /// Create a new estimate
    pub fn new(ambient_intensity: f32) -> Self {
        Self { ambient_intensity }
    }
}

/// Scene-wide lighting state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightingEnvironment {
    /// Global lighting intensity
    pub intensity: f32,
}

impl Default for LightingEnvironment {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}

/// Turns light estimates into scene lighting intensity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingFeedbackController {
    reference_intensity: f32,
}

impl LightingFeedbackController {
    /// Create a controller with the given reference unit
    pub fn new(reference_intensity: f32) -> Self {
        Self { reference_intensity }
    }

    /// Reference unit
    pub fn reference_intensity(&self) -> f32 {
        self.reference_intensity
    }

    /// Scene intensity for an estimate
    pub fn intensity_for(&self, estimate: &LightEstimate) -> f32 {
        estimate.ambient_intensity / self.reference_intensity
    }

    /// Apply this frame's estimate, if there is one.
    ///
    /// Without an estimate the scene keeps its previous intensity. Returns
    /// the intensity written, if any.
    pub fn on_frame<S: SceneGraph + ?Sized>(&self, scene: &mut S, estimate: Option<&LightEstimate>) -> Option<f32> {
        let estimate = estimate?;
        let intensity = self.intensity_for(estimate);

        if !intensity.is_finite() {
            warn!("Ignoring light estimate {:?}: intensity is not finite", estimate);
            return None;
        }

        scene.set_lighting_intensity(intensity);
        Some(intensity)
    }
}

impl Default for LightingFeedbackController {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_INTENSITY)
    }
}
