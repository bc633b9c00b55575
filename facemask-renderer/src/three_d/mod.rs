//! 3D scene support for the face overlay
//!
//! This module provides the face geometry mirror, materials and presets,
//! light-estimate driven lighting, and the scene graph surface.

pub mod lighting;
pub mod material;
pub mod mesh;
pub mod scene3d;

pub use lighting::{LightEstimate, LightingEnvironment, LightingFeedbackController};
pub use material::{LightingModel, Material3D, MaterialContents, MaterialPreset, PresetStore, TextureHandle};
pub use mesh::{FaceGeometry, Vertex3D};
pub use scene3d::{Node3D, NodeId, Scene3D, SceneGraph};
