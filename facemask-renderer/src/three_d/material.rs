//! Material system and the two overlay presets

use crate::primitives::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to an image owned by the host's asset loader
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(String);

impl TextureHandle {
    /// Create a handle from an asset name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Asset name
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// What an appearance channel shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialContents {
    /// Solid color
    Color(Color),
    /// Image texture
    Texture(TextureHandle),
}

/// Shading model applied to the surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightingModel {
    /// Physically-based shading, responds to scene lighting intensity
    #[default]
    PhysicallyBased,
    /// Simple Blinn-Phong shading
    Blinn,
    /// Unlit
    Constant,
}

/// A material defines how a surface looks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material3D {
    /// Material name
    pub name: String,
    /// Shading model
    pub lighting_model: LightingModel,
    /// Base color channel
    pub diffuse: Option<MaterialContents>,
    /// Normal map channel
    pub normal: Option<MaterialContents>,
    /// Transparency mask channel
    pub transparent: Option<MaterialContents>,
    /// Opacity (1.0 = opaque, 0.0 = invisible)
    pub opacity: f32,
    /// Double-sided rendering
    pub double_sided: bool,
}

impl Material3D {
    /// Create a material with every channel empty
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lighting_model: LightingModel::default(),
            diffuse: None,
            normal: None,
            transparent: None,
            opacity: 1.0,
            double_sided: false,
        }
    }

    /// Empty every appearance channel
    pub fn clear_channels(&mut self) {
        self.lighting_model = LightingModel::default();
        self.diffuse = None;
        self.normal = None;
        self.transparent = None;
        self.opacity = 1.0;
    }

    /// Whether any channel currently shows a texture
    pub fn has_texture(&self) -> bool {
        [&self.diffuse, &self.normal, &self.transparent]
            .iter()
            .any(|channel| matches!(channel, Some(MaterialContents::Texture(_))))
    }
}

/// The two appearance presets of the overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialPreset {
    /// Solid color mask
    Basic,
    /// Textured mask
    #[default]
    Painted,
}

impl MaterialPreset {
    /// Both presets
    pub const ALL: [MaterialPreset; 2] = [MaterialPreset::Basic, MaterialPreset::Painted];

    /// The other preset
    pub fn toggled(self) -> Self {
        match self {
            MaterialPreset::Basic => MaterialPreset::Painted,
            MaterialPreset::Painted => MaterialPreset::Basic,
        }
    }

    /// Preset name
    pub fn name(self) -> &'static str {
        match self {
            MaterialPreset::Basic => "basic",
            MaterialPreset::Painted => "painted",
        }
    }
}

impl fmt::Display for MaterialPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed channel values for one preset
#[derive(Debug, Clone, PartialEq)]
pub struct PresetDefinition {
    /// Shading model
    pub lighting_model: LightingModel,
    /// Base color channel
    pub diffuse: MaterialContents,
    /// Normal map channel
    pub normal: Option<MaterialContents>,
    /// Transparency mask channel
    pub transparent: Option<MaterialContents>,
}

impl PresetDefinition {
    fn apply_to(&self, material: &mut Material3D) {
        material.lighting_model = self.lighting_model;
        material.diffuse = Some(self.diffuse.clone());
        material.normal = self.normal.clone();
        material.transparent = self.transparent.clone();
    }
}

/// Default color of the basic preset
pub const BASIC_MASK_COLOR: Color = Color::new(0.0, 0.68, 0.37, 1.0);

/// Default texture of the painted preset
pub const PAINTED_MASK_TEXTURE: &str = "face";

/// Holds the two preset definitions
#[derive(Debug, Clone, PartialEq)]
pub struct PresetStore {
    basic: PresetDefinition,
    painted: PresetDefinition,
}

impl PresetStore {
    /// Create the store from the basic color and painted texture
    pub fn new(basic_color: Color, painted_texture: TextureHandle) -> Self {
        Self {
            basic: PresetDefinition {
                lighting_model: LightingModel::PhysicallyBased,
                diffuse: MaterialContents::Color(basic_color),
                normal: None,
                transparent: None,
            },
            painted: PresetDefinition {
                lighting_model: LightingModel::PhysicallyBased,
                diffuse: MaterialContents::Texture(painted_texture),
                normal: None,
                transparent: None,
            },
        }
    }

    /// Definition of a preset
    pub fn definition(&self, preset: MaterialPreset) -> &PresetDefinition {
        match preset {
            MaterialPreset::Basic => &self.basic,
            MaterialPreset::Painted => &self.painted,
        }
    }

    /// Put `preset` on `material`.
    ///
    /// Every channel is cleared before the preset's channels are written, so
    /// nothing from the previous preset can show through.
    pub fn activate(&self, material: &mut Material3D, preset: MaterialPreset) {
        material.clear_channels();
        self.definition(preset).apply_to(material);
    }
}

impl Default for PresetStore {
    fn default() -> Self {
        Self::new(BASIC_MASK_COLOR, TextureHandle::new(PAINTED_MASK_TEXTURE))
    }
}
