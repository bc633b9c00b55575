//! The overlay node that follows the tracked face

use crate::ar::{AnchorId, FaceAnchor, SessionEvent};
use crate::error::{Result, SessionError};
use crate::three_d::{FaceGeometry, MaterialPreset, Node3D, NodeId, PresetStore, SceneGraph};
use log::{debug, warn};

/// Name given to the overlay node and its geometry
pub const OVERLAY_NODE_NAME: &str = "face-overlay";

/// Handle to the attached overlay: which scene node, for which anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceOverlayNode {
    node: NodeId,
    anchor: AnchorId,
}

impl FaceOverlayNode {
    /// Scene node holding the geometry mirror and material
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Anchor the node follows
    pub fn anchor_id(&self) -> AnchorId {
        self.anchor
    }
}

/// Keeps zero or one overlay node in the scene, in step with the face anchor
#[derive(Debug, Clone)]
pub struct FaceOverlay {
    presets: PresetStore,
    active_preset: MaterialPreset,
    attached: Option<FaceOverlayNode>,
}

impl FaceOverlay {
    /// Create a detached overlay
    pub fn new(presets: PresetStore, initial_preset: MaterialPreset) -> Self {
        Self {
            presets,
            active_preset: initial_preset,
            attached: None,
        }
    }

    /// Build the overlay for a new anchor, replacing any attached one
    pub fn attach<S: SceneGraph + ?Sized>(&mut self, scene: &mut S, anchor: &FaceAnchor) -> Result<FaceOverlayNode> {
        let geometry = FaceGeometry::from_sample(OVERLAY_NODE_NAME, &anchor.mesh)?;

        if let Some(previous) = self.detach(scene) {
            debug!("Replacing overlay for anchor {}", previous.anchor);
        }

        let mut node = Node3D::new(OVERLAY_NODE_NAME).with_geometry(geometry);
        node.transform = anchor.transform;
        self.presets.activate(&mut node.material, self.active_preset);

        let overlay = FaceOverlayNode {
            node: scene.add_child(node),
            anchor: anchor.id,
        };
        self.attached = Some(overlay);
        debug!("Overlay attached to anchor {} with {} preset", anchor.id, self.active_preset);
        Ok(overlay)
    }

    /// Mirror the anchor's latest mesh sample into the attached node
    pub fn update_frame<S: SceneGraph + ?Sized>(&mut self, scene: &mut S, anchor: &FaceAnchor) -> Result<()> {
        let mismatch = || SessionError::GeometryMismatch { anchor: anchor.id };

        let overlay = self.attached.filter(|overlay| overlay.anchor == anchor.id).ok_or_else(mismatch)?;
        let node = scene.node_mut(overlay.node).ok_or_else(mismatch)?;

        match node.geometry.as_mut() {
            Some(geometry) => geometry.update_from(&anchor.mesh)?,
            None => node.geometry = Some(FaceGeometry::from_sample(OVERLAY_NODE_NAME, &anchor.mesh)?),
        }
        node.transform = anchor.transform;
        Ok(())
    }

    /// Remove the overlay from the scene, dropping its geometry
    pub fn detach<S: SceneGraph + ?Sized>(&mut self, scene: &mut S) -> Option<FaceOverlayNode> {
        let overlay = self.attached.take()?;
        if scene.remove_child(overlay.node).is_none() {
            warn!("Overlay node for anchor {} was already gone from the scene", overlay.anchor);
        }
        debug!("Overlay detached from anchor {}", overlay.anchor);
        Some(overlay)
    }

    /// Detach only if the overlay follows `anchor`
    pub fn detach_anchor<S: SceneGraph + ?Sized>(&mut self, scene: &mut S, anchor: AnchorId) -> bool {
        match self.attached {
            Some(overlay) if overlay.anchor == anchor => self.detach(scene).is_some(),
            _ => false,
        }
    }

    /// Swap the appearance; geometry is left alone
    pub fn set_preset<S: SceneGraph + ?Sized>(&mut self, scene: &mut S, preset: MaterialPreset) {
        self.active_preset = preset;

        if let Some(overlay) = self.attached {
            if let Some(node) = scene.node_mut(overlay.node) {
                self.presets.activate(&mut node.material, preset);
            }
        }
    }

    /// React to a republished session event
    pub fn handle_event<S: SceneGraph + ?Sized>(&mut self, scene: &mut S, event: &SessionEvent) {
        match event {
            SessionEvent::AnchorAdded(anchor) => {
                if let Err(err) = self.attach(scene, anchor) {
                    warn!("Could not attach overlay to anchor {}: {}", anchor.id, err);
                }
            }
            SessionEvent::AnchorUpdated(anchor) => {
                if let Err(err) = self.update_frame(scene, anchor) {
                    warn!("Ignoring update: {}", err);
                }
            }
            SessionEvent::AnchorRemoved(id) => {
                if !self.detach_anchor(scene, *id) {
                    debug!("No overlay attached for removed anchor {}", id);
                }
            }
            _ => {}
        }
    }

    /// Currently selected preset
    pub fn active_preset(&self) -> MaterialPreset {
        self.active_preset
    }

    /// Attached overlay, if any
    pub fn attached(&self) -> Option<FaceOverlayNode> {
        self.attached
    }

    /// Preset definitions
    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::MeshSample;
    use crate::three_d::{MaterialContents, Scene3D};
    use glam::{Mat4, Vec3};

    fn anchor(id: AnchorId, z: f32) -> FaceAnchor {
        let mesh = MeshSample::new(
            vec![Vec3::new(0.0, 0.0, z), Vec3::new(1.0, 0.0, z), Vec3::new(0.0, 1.0, z)],
            Vec::new(),
            vec![0, 1, 2],
        );
        FaceAnchor::new(id, Mat4::from_translation(Vec3::new(0.0, 0.0, -0.5)), mesh)
    }

    #[test]
    fn test_attach_builds_node() {
        let mut scene = Scene3D::new("test");
        let mut overlay = FaceOverlay::new(PresetStore::default(), MaterialPreset::Basic);
        let face = anchor(AnchorId::new(), 0.0);

        let attached = overlay.attach(&mut scene, &face).unwrap();
        let node = scene.node(attached.node_id()).unwrap();

        assert_eq!(attached.anchor_id(), face.id);
        assert_eq!(node.transform, face.transform);
        assert!(node.geometry.as_ref().unwrap().mirrors(&face.mesh));
        assert!(matches!(node.material.diffuse, Some(MaterialContents::Color(_))));
    }

    #[test]
    fn test_set_preset_keeps_geometry() {
        let mut scene = Scene3D::new("test");
        let mut overlay = FaceOverlay::new(PresetStore::default(), MaterialPreset::Basic);
        let face = anchor(AnchorId::new(), 0.2);
        let attached = overlay.attach(&mut scene, &face).unwrap();

        overlay.set_preset(&mut scene, MaterialPreset::Painted);

        let node = scene.node(attached.node_id()).unwrap();
        assert!(node.material.has_texture());
        assert!(node.geometry.as_ref().unwrap().mirrors(&face.mesh));
        assert_eq!(node.geometry.as_ref().unwrap().revision(), 0);
        assert_eq!(overlay.active_preset(), MaterialPreset::Painted);
    }

    #[test]
    fn test_set_preset_while_detached_applies_on_attach() {
        let mut scene = Scene3D::new("test");
        let mut overlay = FaceOverlay::new(PresetStore::default(), MaterialPreset::Basic);
        overlay.set_preset(&mut scene, MaterialPreset::Painted);

        let attached = overlay.attach(&mut scene, &anchor(AnchorId::new(), 0.0)).unwrap();
        assert!(scene.node(attached.node_id()).unwrap().material.has_texture());
    }

    #[test]
    fn test_detach_other_anchor_is_ignored() {
        let mut scene = Scene3D::new("test");
        let mut overlay = FaceOverlay::new(PresetStore::default(), MaterialPreset::Painted);
        overlay.attach(&mut scene, &anchor(AnchorId::new(), 0.0)).unwrap();

        assert!(!overlay.detach_anchor(&mut scene, AnchorId::new()));
        assert_eq!(scene.child_count(), 1);
    }

    #[test]
    fn test_invalid_sample_does_not_replace_overlay() {
        let mut scene = Scene3D::new("test");
        let mut overlay = FaceOverlay::new(PresetStore::default(), MaterialPreset::Painted);
        let face = anchor(AnchorId::new(), 0.0);
        overlay.attach(&mut scene, &face).unwrap();

        let broken = FaceAnchor::new(AnchorId::new(), Mat4::IDENTITY, MeshSample::new(vec![Vec3::ZERO], Vec::new(), vec![0, 1, 2]));
        assert!(overlay.attach(&mut scene, &broken).is_err());
        assert_eq!(overlay.attached().map(|o| o.anchor_id()), Some(face.id));
        assert_eq!(scene.child_count(), 1);
    }
}
