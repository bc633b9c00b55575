//! Tracked face anchors and the mesh payload they carry

use crate::error::{Result, SessionError};
use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Stable identity of one tracked face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorId(Uuid);

impl AnchorId {
    /// Create a fresh random identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an identity issued by the tracking provider
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AnchorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vertex and topology payload for one frame of a tracked face
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshSample {
    /// Vertex positions in anchor space
    pub vertices: Vec<Vec3>,
    /// Texture coordinates, one per vertex (may be empty)
    pub texture_coordinates: Vec<Vec2>,
    /// Triangle list indices into `vertices`
    pub triangle_indices: Vec<u32>,
}

impl MeshSample {
    /// Create a new mesh sample
    pub fn new(vertices: Vec<Vec3>, texture_coordinates: Vec<Vec2>, triangle_indices: Vec<u32>) -> Self {
        Self {
            vertices,
            texture_coordinates,
            triangle_indices,
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangle_indices.len() / 3
    }

    /// Check that the sample describes a well-formed triangle mesh
    pub fn validate(&self) -> Result<()> {
        if self.triangle_indices.len() % 3 != 0 {
            return Err(SessionError::InvalidMeshSample(format!(
                "index count {} is not a multiple of 3",
                self.triangle_indices.len()
            )));
        }

        if !self.texture_coordinates.is_empty() && self.texture_coordinates.len() != self.vertices.len() {
            return Err(SessionError::InvalidMeshSample(format!(
                "{} texture coordinates for {} vertices",
                self.texture_coordinates.len(),
                self.vertices.len()
            )));
        }

        let vertex_count = self.vertices.len();
        if let Some(index) = self.triangle_indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(SessionError::InvalidMeshSample(format!(
                "index {} out of range for {} vertices",
                index, vertex_count
            )));
        }

        Ok(())
    }

    /// Whether `other` uses the same triangle layout
    pub fn same_topology(&self, other: &MeshSample) -> bool {
        self.vertices.len() == other.vertices.len() && self.triangle_indices == other.triangle_indices
    }
}

/// A tracked face: identity, world pose and the current mesh sample
#[derive(Debug, Clone, PartialEq)]
pub struct FaceAnchor {
    /// Identity, stable while the face stays tracked
    pub id: AnchorId,
    /// Pose in world space
    pub transform: Mat4,
    /// Mesh payload for the current frame
    pub mesh: Arc<MeshSample>,
}

impl FaceAnchor {
    /// Create a new anchor
    pub fn new(id: AnchorId, transform: Mat4, mesh: MeshSample) -> Self {
        Self {
            id,
            transform,
            mesh: Arc::new(mesh),
        }
    }

    /// Create an anchor from a position and rotation
    pub fn from_pose(id: AnchorId, position: Vec3, rotation: Quat, mesh: MeshSample) -> Self {
        Self::new(id, Mat4::from_rotation_translation(rotation, position), mesh)
    }

    /// The same face on a later frame
    pub fn next_frame(&self, transform: Mat4, mesh: MeshSample) -> Self {
        Self::new(self.id, transform, mesh)
    }

    /// Position in world space
    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }
}
