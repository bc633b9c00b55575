//! Configuration handling for the facemask host

use anyhow::{Context, Result};
use facemask_renderer::config::RendererConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub renderer: RendererConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Behavior of the simulated face tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Delay before the face is first detected
    #[serde(default = "default_detect_after_ms")]
    pub detect_after_ms: u64,

    /// Mesh resolution (quads per side)
    #[serde(default = "default_mesh_resolution")]
    pub mesh_resolution: u32,

    /// Ambient light the estimate oscillates around
    #[serde(default = "default_ambient_intensity")]
    pub ambient_intensity: f32,

    /// Oscillation amplitude of the ambient light
    #[serde(default = "default_ambient_swing")]
    pub ambient_swing: f32,

    /// Frames between light estimates; frames in between carry none
    #[serde(default = "default_estimate_every")]
    pub estimate_every: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            detect_after_ms: default_detect_after_ms(),
            mesh_resolution: default_mesh_resolution(),
            ambient_intensity: default_ambient_intensity(),
            ambient_swing: default_ambient_swing(),
            estimate_every: default_estimate_every(),
        }
    }
}

fn default_detect_after_ms() -> u64 { 50 }
fn default_mesh_resolution() -> u32 { 16 }
fn default_ambient_intensity() -> f32 { 1000.0 }
fn default_ambient_swing() -> f32 { 400.0 }
fn default_estimate_every() -> u32 { 1 }

/// Load configuration from file or use defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str::<Config>(&content).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => Config::default(),
    };

    config.renderer.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facemask_renderer::three_d::MaterialPreset;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.renderer, RendererConfig::default());
        assert_eq!(config.simulation.mesh_resolution, 16);
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[renderer]
initial_preset = "basic"
reset_on_preset_toggle = false

[simulation]
ambient_intensity = 500.0
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.renderer.initial_preset, MaterialPreset::Basic);
        assert!(!config.renderer.reset_on_preset_toggle);
        assert_eq!(config.renderer.reference_intensity, 1000.0);
        assert_eq!(config.simulation.ambient_intensity, 500.0);
        assert_eq!(config.simulation.estimate_every, 1);
    }

    #[test]
    fn test_invalid_renderer_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[renderer]\nreference_intensity = -1.0").unwrap();

        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(load_config(Some(Path::new("/nonexistent/facemask.toml"))).is_err());
    }
}
