//! 3D scene management

use crate::three_d::{FaceGeometry, LightingEnvironment, Material3D};
use glam::Mat4;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Handle to a node owned by a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

/// A node in the 3D scene graph
#[derive(Debug, Clone)]
pub struct Node3D {
    /// Node name
    pub name: String,
    /// World transform
    pub transform: Mat4,
    /// Geometry, if this node renders anything
    pub geometry: Option<FaceGeometry>,
    /// Surface material
    pub material: Material3D,
}

impl Node3D {
    /// Create a new empty node
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            material: Material3D::new(name.clone()),
            name,
            transform: Mat4::IDENTITY,
            geometry: None,
        }
    }

    /// Attach geometry to the node
    pub fn with_geometry(mut self, geometry: FaceGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }
}

/// The renderer-facing surface the overlay and lighting write into
pub trait SceneGraph {
    /// Add a node under the scene root
    fn add_child(&mut self, node: Node3D) -> NodeId;

    /// Remove a node, handing it back
    fn remove_child(&mut self, id: NodeId) -> Option<Node3D>;

    /// Look up a node
    fn node(&self, id: NodeId) -> Option<&Node3D>;

    /// Look up a node for mutation
    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node3D>;

    /// Current global lighting intensity
    fn lighting_intensity(&self) -> f32;

    /// Set the global lighting intensity
    fn set_lighting_intensity(&mut self, intensity: f32);
}

/// In-memory scene graph with arena-owned nodes
#[derive(Debug, Clone)]
pub struct Scene3D {
    /// Scene name
    pub name: String,
    nodes: FxHashMap<NodeId, Node3D>,
    /// Root children in insertion order
    roots: Vec<NodeId>,
    next_id: u64,
    lighting: LightingEnvironment,
}

impl Scene3D {
    /// Create a new empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: FxHashMap::default(),
            roots: Vec::new(),
            next_id: 0,
            lighting: LightingEnvironment::default(),
        }
    }

    /// Number of nodes under the root
    pub fn child_count(&self) -> usize {
        self.roots.len()
    }

    /// Root children in insertion order
    pub fn children(&self) -> impl Iterator<Item = (NodeId, &Node3D)> + '_ {
        self.roots.iter().filter_map(|id| self.nodes.get(id).map(|node| (*id, node)))
    }

    /// Lighting environment
    pub fn lighting(&self) -> &LightingEnvironment {
        &self.lighting
    }
}

impl SceneGraph for Scene3D {
    fn add_child(&mut self, node: Node3D) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        self.roots.push(id);
        id
    }

    fn remove_child(&mut self, id: NodeId) -> Option<Node3D> {
        let node = self.nodes.remove(&id)?;
        self.roots.retain(|root| *root != id);
        Some(node)
    }

    fn node(&self, id: NodeId) -> Option<&Node3D> {
        self.nodes.get(&id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node3D> {
        self.nodes.get_mut(&id)
    }

    fn lighting_intensity(&self) -> f32 {
        self.lighting.intensity
    }

    fn set_lighting_intensity(&mut self, intensity: f32) {
        self.lighting.intensity = intensity;
    }
}
