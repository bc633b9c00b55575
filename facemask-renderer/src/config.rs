//! Tracking and renderer configuration

use crate::error::{Result, SessionError};
use crate::primitives::Color;
use crate::three_d::lighting::DEFAULT_REFERENCE_INTENSITY;
use crate::three_d::material::{BASIC_MASK_COLOR, PAINTED_MASK_TEXTURE};
use crate::three_d::{MaterialPreset, PresetStore, TextureHandle};
use serde::{Deserialize, Serialize};

/// Configuration handed to the tracking provider on every run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceTrackingConfig {
    /// Produce a light estimate with every frame
    #[serde(default = "default_true")]
    pub light_estimation_enabled: bool,
    /// Capture microphone audio alongside tracking
    #[serde(default)]
    pub provides_audio_data: bool,
    /// Also track device position in the world
    #[serde(default)]
    pub world_tracking_enabled: bool,
    /// Faces tracked at once
    #[serde(default = "default_tracked_faces")]
    pub maximum_number_of_tracked_faces: u32,
}

impl Default for FaceTrackingConfig {
    fn default() -> Self {
        Self {
            light_estimation_enabled: true,
            provides_audio_data: false,
            world_tracking_enabled: false,
            maximum_number_of_tracked_faces: default_tracked_faces(),
        }
    }
}

impl FaceTrackingConfig {
    /// Reject anything other than single-face tracking with light estimation,
    /// without audio or world tracking
    pub fn validate(&self) -> Result<()> {
        if !self.light_estimation_enabled {
            return Err(SessionError::InvalidConfiguration(
                "light estimation drives scene lighting and cannot be disabled".to_string(),
            ));
        }
        if self.maximum_number_of_tracked_faces != 1 {
            return Err(SessionError::InvalidConfiguration(format!(
                "exactly one tracked face is supported, got {}",
                self.maximum_number_of_tracked_faces
            )));
        }
        if self.provides_audio_data {
            return Err(SessionError::InvalidConfiguration("audio capture is not supported".to_string()));
        }
        if self.world_tracking_enabled {
            return Err(SessionError::InvalidConfiguration("world tracking is not supported".to_string()));
        }
        Ok(())
    }
}

/// Renderer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Preset shown when the overlay first attaches
    #[serde(default)]
    pub initial_preset: MaterialPreset,

    /// Ambient intensity that maps to a scene intensity of 1.0
    #[serde(default = "default_reference_intensity")]
    pub reference_intensity: f32,

    /// Scene intensity before the first light estimate arrives
    #[serde(default = "default_initial_intensity")]
    pub initial_lighting_intensity: f32,

    /// Re-arm tracking whenever the preset is toggled
    #[serde(default = "default_true")]
    pub reset_on_preset_toggle: bool,

    /// Diffuse color of the basic preset
    #[serde(default = "default_basic_color")]
    pub basic_color: Color,

    /// Texture asset of the painted preset
    #[serde(default = "default_painted_texture")]
    pub painted_texture: String,

    /// Tracking configuration
    #[serde(default)]
    pub tracking: FaceTrackingConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            initial_preset: MaterialPreset::default(),
            reference_intensity: default_reference_intensity(),
            initial_lighting_intensity: default_initial_intensity(),
            reset_on_preset_toggle: default_true(),
            basic_color: default_basic_color(),
            painted_texture: default_painted_texture(),
            tracking: FaceTrackingConfig::default(),
        }
    }
}

impl RendererConfig {
    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RendererConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !self.reference_intensity.is_finite() || self.reference_intensity <= 0.0 {
            return Err(SessionError::Config(format!(
                "reference_intensity must be a positive number, got {}",
                self.reference_intensity
            )));
        }
        if !self.initial_lighting_intensity.is_finite() || self.initial_lighting_intensity < 0.0 {
            return Err(SessionError::Config(format!(
                "initial_lighting_intensity must be a non-negative number, got {}",
                self.initial_lighting_intensity
            )));
        }
        if !self.basic_color.is_normalized() {
            return Err(SessionError::Config("basic_color components must be within 0.0 - 1.0".to_string()));
        }
        if self.painted_texture.is_empty() {
            return Err(SessionError::Config("painted_texture must name an asset".to_string()));
        }
        self.tracking.validate()
    }

    /// Build the preset store described by this configuration
    pub fn preset_store(&self) -> PresetStore {
        PresetStore::new(self.basic_color, TextureHandle::new(self.painted_texture.clone()))
    }
}

fn default_true() -> bool { true }
fn default_tracked_faces() -> u32 { 1 }
fn default_reference_intensity() -> f32 { DEFAULT_REFERENCE_INTENSITY }
fn default_initial_intensity() -> f32 { 1.0 }
fn default_basic_color() -> Color { BASIC_MASK_COLOR }
fn default_painted_texture() -> String { PAINTED_MASK_TEXTURE.to_string() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RendererConfig::default();
        assert_eq!(config.initial_preset, MaterialPreset::Painted);
        assert_eq!(config.reference_intensity, 1000.0);
        assert!(config.reset_on_preset_toggle);
        assert!(config.validate().is_ok());

        let tracking = FaceTrackingConfig::default();
        assert!(tracking.light_estimation_enabled);
        assert!(!tracking.provides_audio_data);
        assert!(!tracking.world_tracking_enabled);
        assert_eq!(tracking.maximum_number_of_tracked_faces, 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RendererConfig::from_json(r#"{ "initial_preset": "basic", "reference_intensity": 500.0 }"#).unwrap();
        assert_eq!(config.initial_preset, MaterialPreset::Basic);
        assert_eq!(config.reference_intensity, 500.0);
        assert_eq!(config.painted_texture, "face");
        assert_eq!(config.tracking, FaceTrackingConfig::default());
    }

    #[test]
    fn test_rejects_bad_reference_intensity() {
        let result = RendererConfig::from_json(r#"{ "reference_intensity": 0.0 }"#);
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(RendererConfig::from_json("{"), Err(SessionError::Config(_))));
    }

    #[test]
    fn test_rejects_multi_face_tracking() {
        let tracking = FaceTrackingConfig {
            maximum_number_of_tracked_faces: 3,
            ..FaceTrackingConfig::default()
        };
        assert!(matches!(tracking.validate(), Err(SessionError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_rejects_disabled_light_estimation() {
        let result = RendererConfig::from_json(r#"{ "tracking": { "light_estimation_enabled": false } }"#);
        assert!(matches!(result, Err(SessionError::InvalidConfiguration(_))));
    }
}
