//! Renderable mirror of the tracked face mesh

use crate::ar::MeshSample;
use crate::error::Result;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// A 3D vertex with position, normal, and texture coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex3D {
    /// Position in 3D space
    pub position: Vec3,
    /// Surface normal
    pub normal: Vec3,
    /// Texture coordinates
    pub tex_coords: Vec2,
}

impl Vertex3D {
    /// Create a new vertex
    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }
}

/// Face geometry kept in step with the tracker's mesh samples.
///
/// Buffers are rewritten in place on every update, so a steady stream of
/// samples with the same vertex count never reallocates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceGeometry {
    /// Geometry name
    pub name: String,
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    revision: u64,
}

impl FaceGeometry {
    /// Build geometry from the first sample of a face
    pub fn from_sample(name: impl Into<String>, sample: &MeshSample) -> Result<Self> {
        sample.validate()?;

        let mut geometry = Self {
            name: name.into(),
            vertices: Vec::with_capacity(sample.vertex_count()),
            indices: Vec::with_capacity(sample.triangle_indices.len()),
            revision: 0,
        };
        geometry.write_sample(sample);
        Ok(geometry)
    }

    /// Replace vertex and topology data from a newer sample
    pub fn update_from(&mut self, sample: &MeshSample) -> Result<()> {
        sample.validate()?;
        self.write_sample(sample);
        self.revision += 1;
        Ok(())
    }

    fn write_sample(&mut self, sample: &MeshSample) {
        self.vertices.resize(sample.vertex_count(), Vertex3D::default());
        for (i, (vertex, position)) in self.vertices.iter_mut().zip(&sample.vertices).enumerate() {
            vertex.position = *position;
            vertex.normal = Vec3::ZERO;
            vertex.tex_coords = sample.texture_coordinates.get(i).copied().unwrap_or(Vec2::ZERO);
        }

        // Face topology is usually fixed for a session
        if self.indices != sample.triangle_indices {
            self.indices.clear();
            self.indices.extend_from_slice(&sample.triangle_indices);
        }

        self.recompute_normals();
    }

    /// Area-weighted smooth normals
    fn recompute_normals(&mut self) {
        for triangle in self.indices.chunks_exact(3) {
            let (a, b, c) = (triangle[0] as usize, triangle[1] as usize, triangle[2] as usize);
            let pa = self.vertices[a].position;
            let face_normal = (self.vertices[b].position - pa).cross(self.vertices[c].position - pa);

            self.vertices[a].normal += face_normal;
            self.vertices[b].normal += face_normal;
            self.vertices[c].normal += face_normal;
        }

        for vertex in &mut self.vertices {
            vertex.normal = vertex.normal.normalize_or_zero();
        }
    }

    /// Vertex data
    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    /// Index data (triangles)
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of updates applied since construction
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether this geometry reflects exactly the given sample
    pub fn mirrors(&self, sample: &MeshSample) -> bool {
        self.indices == sample.triangle_indices
            && self.vertices.len() == sample.vertices.len()
            && self
                .vertices
                .iter()
                .zip(&sample.vertices)
                .all(|(vertex, position)| vertex.position == *position)
    }

    /// Calculate bounding box
    pub fn bounding_box(&self) -> (Vec3, Vec3) {
        if self.vertices.is_empty() {
            return (Vec3::ZERO, Vec3::ZERO);
        }

        let mut min = self.vertices[0].position;
        let mut max = self.vertices[0].position;

        for vertex in &self.vertices[1..] {
            min = min.min(vertex.position);
            max = max.max(vertex.position);
        }

        (min, max)
    }

    /// Calculate center point
    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounding_box();
        (min + max) * 0.5
    }
}
