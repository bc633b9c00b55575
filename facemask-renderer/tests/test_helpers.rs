//! Test helpers shared by the integration tests
#![allow(dead_code)]

use facemask_renderer::ar::{
    AnchorId, FaceAnchor, FaceTrackingProvider, MeshSample, RunOptions, SensorEvent, SensorEventSender,
    SessionObserver,
};
use facemask_renderer::config::FaceTrackingConfig;
use facemask_renderer::three_d::LightEstimate;
use glam::{Mat4, Vec2, Vec3};
use std::cell::RefCell;
use std::rc::Rc;

/// What the provider has been asked to do
#[derive(Default)]
pub struct ProviderLog {
    pub runs: Vec<RunOptions>,
    pub pauses: usize,
    pub sender: Option<SensorEventSender>,
}

/// Provider whose events are pushed by the test
pub struct ScriptedProvider {
    supported: bool,
    log: Rc<RefCell<ProviderLog>>,
}

/// Test-side view of a [`ScriptedProvider`]
#[derive(Clone)]
pub struct ProviderHandle(Rc<RefCell<ProviderLog>>);

impl ScriptedProvider {
    pub fn new(supported: bool) -> (Box<dyn FaceTrackingProvider>, ProviderHandle) {
        let log = Rc::new(RefCell::new(ProviderLog::default()));
        let provider = ScriptedProvider {
            supported,
            log: log.clone(),
        };
        (Box::new(provider), ProviderHandle(log))
    }
}

impl FaceTrackingProvider for ScriptedProvider {
    fn is_face_tracking_supported(&self) -> bool {
        self.supported
    }

    fn run(&mut self, _config: &FaceTrackingConfig, options: RunOptions, events: SensorEventSender) {
        let mut log = self.log.borrow_mut();
        log.runs.push(options);
        log.sender = Some(events);
    }

    fn pause(&mut self) {
        self.log.borrow_mut().pauses += 1;
    }
}

impl ProviderHandle {
    /// Send through the sender of the latest run
    pub fn send(&self, event: SensorEvent) {
        let sender = self.sender();
        assert!(sender.send(event), "session manager dropped");
    }

    /// Sender of the latest run
    pub fn sender(&self) -> SensorEventSender {
        self.0.borrow().sender.clone().expect("provider was never run")
    }

    pub fn runs(&self) -> Vec<RunOptions> {
        self.0.borrow().runs.clone()
    }

    pub fn pauses(&self) -> usize {
        self.0.borrow().pauses
    }

    pub fn frame(&self, timestamp: f64, ambient_intensity: Option<f32>) {
        self.send(SensorEvent::Frame {
            timestamp,
            light_estimate: ambient_intensity.map(LightEstimate::new),
        });
    }
}

/// A flat grid of `rows` x `cols` quads at depth `z`
pub fn grid_mesh(rows: u32, cols: u32, z: f32) -> MeshSample {
    let mut vertices = Vec::new();
    let mut tex_coords = Vec::new();
    for row in 0..=rows {
        for col in 0..=cols {
            let u = col as f32 / cols as f32;
            let v = row as f32 / rows as f32;
            vertices.push(Vec3::new(u - 0.5, v - 0.5, z));
            tex_coords.push(Vec2::new(u, v));
        }
    }

    let mut indices = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            let current = row * (cols + 1) + col;
            let next = current + cols + 1;
            indices.extend_from_slice(&[current, current + 1, next, next, current + 1, next + 1]);
        }
    }

    MeshSample::new(vertices, tex_coords, indices)
}

/// A face anchor at the origin with a 4x4 grid mesh
pub fn face(id: AnchorId, z: f32) -> FaceAnchor {
    FaceAnchor::new(id, Mat4::IDENTITY, grid_mesh(4, 4, z))
}

/// Records every callback as a short string
#[derive(Clone, Default)]
pub struct RecordingObserver(pub Rc<RefCell<Vec<String>>>);

impl RecordingObserver {
    pub fn calls(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    fn push(&self, call: String) {
        self.0.borrow_mut().push(call);
    }
}

impl SessionObserver for RecordingObserver {
    fn on_anchor_added(&mut self, anchor: &FaceAnchor) {
        self.push(format!("added {}", anchor.id));
    }

    fn on_anchor_updated(&mut self, anchor: &FaceAnchor) {
        self.push(format!("updated {}", anchor.id));
    }

    fn on_anchor_removed(&mut self, id: AnchorId) {
        self.push(format!("removed {}", id));
    }

    fn on_light_estimate(&mut self, estimate: &LightEstimate) {
        self.push(format!("light {}", estimate.ambient_intensity));
    }

    fn on_interrupted(&mut self) {
        self.push("interrupted".to_string());
    }

    fn on_interruption_ended(&mut self) {
        self.push("interruption ended".to_string());
    }

    fn on_failed(&mut self, reason: &str) {
        self.push(format!("failed {}", reason));
    }
}

/// Install a test logger once
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
