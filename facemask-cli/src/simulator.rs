//! A face tracker that runs without a camera
//!
//! Produces a breathing grid mesh that slowly turns its head, with an
//! oscillating ambient light estimate, from a background capture thread.

use crate::config::SimulationConfig;
use facemask_renderer::ar::{AnchorId, FaceAnchor, FaceTrackingProvider, MeshSample, RunOptions, SensorEvent, SensorEventSender};
use facemask_renderer::config::FaceTrackingConfig;
use facemask_renderer::three_d::LightEstimate;
use glam::{Quat, Vec2, Vec3};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Scripted sensor interruption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interruption {
    /// Capture frame the interruption starts on
    pub at_frame: u64,
    /// Frames it lasts
    pub frames: u64,
}

/// Simulated tracker configuration for one run
#[derive(Debug, Clone)]
pub struct SimulatorOptions {
    pub simulation: SimulationConfig,
    pub frame_interval: Duration,
    pub interruption: Option<Interruption>,
    pub supported: bool,
}

struct Capture {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// [`FaceTrackingProvider`] backed by a synthetic capture thread
pub struct SimulatedFaceTracker {
    options: SimulatorOptions,
    capture: Option<Capture>,
    /// Set once the scripted interruption has been played, across runs
    interruption_played: Arc<AtomicBool>,
}

impl SimulatedFaceTracker {
    pub fn new(options: SimulatorOptions) -> Self {
        Self {
            options,
            capture: None,
            interruption_played: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl FaceTrackingProvider for SimulatedFaceTracker {
    fn is_face_tracking_supported(&self) -> bool {
        self.options.supported
    }

    fn run(&mut self, config: &FaceTrackingConfig, options: RunOptions, events: SensorEventSender) {
        // A re-run replaces the capture thread; anchors never outlive it
        self.pause();
        debug!(?options, generation = events.generation(), "Simulated capture starting");

        let stop = Arc::new(AtomicBool::new(false));
        let script = CaptureScript {
            options: self.options.clone(),
            light_estimation: config.light_estimation_enabled,
            interruption_played: self.interruption_played.clone(),
            stop: stop.clone(),
            events,
        };
        let spawned = thread::Builder::new()
            .name("facemask-capture".to_string())
            .spawn(move || script.run());

        match spawned {
            Ok(thread) => self.capture = Some(Capture { stop, thread }),
            Err(err) => warn!("Could not spawn capture thread: {}", err),
        }
    }

    fn pause(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.stop.store(true, Ordering::Relaxed);
            if capture.thread.join().is_err() {
                warn!("Capture thread panicked");
            }
            debug!("Simulated capture stopped");
        }
    }
}

impl Drop for SimulatedFaceTracker {
    fn drop(&mut self) {
        self.pause();
    }
}

struct CaptureScript {
    options: SimulatorOptions,
    light_estimation: bool,
    interruption_played: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    events: SensorEventSender,
}

/// Granularity at which sleeping capture threads notice a stop request
const STOP_POLL: Duration = Duration::from_millis(5);

impl CaptureScript {
    fn run(self) {
        let simulation = &self.options.simulation;
        if !self.sleep(Duration::from_millis(simulation.detect_after_ms)) {
            return;
        }

        let mut face: Option<FaceAnchor> = None;
        let mut frame: u64 = 0;
        let mut interrupted_until: Option<u64> = None;

        while !self.stop.load(Ordering::Relaxed) {
            let timestamp = frame as f64 * self.options.frame_interval.as_secs_f64();

            if let Some(interruption) = self.options.interruption {
                if frame >= interruption.at_frame && !self.interruption_played.swap(true, Ordering::Relaxed) {
                    // Tracking is lost with the interruption; a fresh face follows
                    face = None;
                    interrupted_until = Some(frame + interruption.frames);
                    self.send(SensorEvent::Interrupted);
                }
            }
            match interrupted_until {
                Some(end) if frame < end => {
                    frame += 1;
                    self.sleep(self.options.frame_interval);
                    continue;
                }
                Some(_) => {
                    interrupted_until = None;
                    self.send(SensorEvent::InterruptionEnded);
                }
                None => {}
            }

            let light_estimate = (self.light_estimation && frame % u64::from(simulation.estimate_every.max(1)) == 0)
                .then(|| LightEstimate::new(ambient_at(simulation, timestamp)));
            if !self.send(SensorEvent::Frame {
                timestamp,
                light_estimate,
            }) {
                break;
            }

            let mesh = face_mesh(simulation.mesh_resolution, timestamp);
            let rotation = Quat::from_rotation_y((timestamp * 0.8).sin() as f32 * 0.4);
            let position = Vec3::new(0.0, 0.0, -0.5);
            let event = match &face {
                Some(current) => {
                    let next = FaceAnchor::from_pose(current.id, position, rotation, mesh);
                    face = Some(next.clone());
                    SensorEvent::AnchorUpdated(next)
                }
                None => {
                    let added = FaceAnchor::from_pose(AnchorId::new(), position, rotation, mesh);
                    face = Some(added.clone());
                    SensorEvent::AnchorAdded(added)
                }
            };
            if !self.send(event) {
                break;
            }

            frame += 1;
            self.sleep(self.options.frame_interval);
        }
    }

    /// Sleep for `duration` unless stopped first. Returns false if stopped.
    fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.stop.load(Ordering::Relaxed) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(STOP_POLL.min(deadline - now));
        }
    }

    fn send(&self, event: SensorEvent) -> bool {
        self.events.send(event)
    }
}

fn ambient_at(simulation: &SimulationConfig, timestamp: f64) -> f32 {
    let swing = (timestamp * 0.5).sin() as f32 * simulation.ambient_swing;
    (simulation.ambient_intensity + swing).max(0.0)
}

/// A curved grid face whose jaw opens and closes over time
pub fn face_mesh(resolution: u32, timestamp: f64) -> MeshSample {
    let resolution = resolution.max(1);
    let jaw = ((timestamp * 2.0).sin() as f32 + 1.0) * 0.01;
    let mut vertices = Vec::with_capacity(((resolution + 1) * (resolution + 1)) as usize);
    let mut tex_coords = Vec::with_capacity(vertices.capacity());

    for row in 0..=resolution {
        for col in 0..=resolution {
            let u = col as f32 / resolution as f32;
            let v = row as f32 / resolution as f32;
            let x = (u - 0.5) * 0.16;
            let mut y = (v - 0.5) * 0.22;
            if v < 0.35 {
                y -= jaw * (0.35 - v) / 0.35;
            }
            let z = 0.04 * (1.0 - (2.0 * u - 1.0).powi(2)) * (1.0 - (2.0 * v - 1.0).powi(2));
            vertices.push(Vec3::new(x, y, z));
            tex_coords.push(Vec2::new(u, 1.0 - v));
        }
    }

    let mut indices = Vec::with_capacity((resolution * resolution * 6) as usize);
    for row in 0..resolution {
        for col in 0..resolution {
            let current = row * (resolution + 1) + col;
            let next = current + resolution + 1;
            indices.extend_from_slice(&[current, next, current + 1, current + 1, next, next + 1]);
        }
    }

    MeshSample::new(vertices, tex_coords, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facemask_renderer::ar::{SessionEvent, TrackingSessionManager};

    fn options(detect_after_ms: u64, interruption: Option<Interruption>) -> SimulatorOptions {
        SimulatorOptions {
            simulation: SimulationConfig {
                detect_after_ms,
                mesh_resolution: 2,
                ..SimulationConfig::default()
            },
            frame_interval: Duration::from_millis(1),
            interruption,
            supported: true,
        }
    }

    fn interruptions(events: &[SessionEvent]) -> usize {
        events.iter().filter(|event| **event == SessionEvent::Interrupted).count()
    }

    #[test]
    fn test_rearm_during_detection_delay_does_not_block() {
        let tracker = SimulatedFaceTracker::new(options(60_000, None));
        let mut session = TrackingSessionManager::new(Box::new(tracker));
        session.start(FaceTrackingConfig::default()).unwrap();

        let started = Instant::now();
        session.reset().unwrap();
        session.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_interruption_plays_once_across_runs() {
        let interruption = Interruption { at_frame: 2, frames: 3 };
        let tracker = SimulatedFaceTracker::new(options(0, Some(interruption)));
        let mut session = TrackingSessionManager::new(Box::new(tracker));
        session.start(FaceTrackingConfig::default()).unwrap();

        thread::sleep(Duration::from_millis(200));
        let first_run = session.pump();
        assert_eq!(interruptions(&first_run), 1);
        assert!(first_run.contains(&SessionEvent::InterruptionEnded));

        session.reset().unwrap();
        thread::sleep(Duration::from_millis(200));
        let second_run = session.pump();
        assert_eq!(interruptions(&second_run), 0);
        assert!(second_run.iter().any(|event| matches!(event, SessionEvent::AnchorAdded(_))));
        session.stop();
    }

    #[test]
    fn test_face_mesh_is_valid() {
        let mesh = face_mesh(8, 1.25);
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.vertex_count(), 81);
        assert_eq!(mesh.triangle_count(), 128);
    }

    #[test]
    fn test_topology_is_stable_over_time() {
        assert!(face_mesh(4, 0.0).same_topology(&face_mesh(4, 3.0)));
        assert_ne!(face_mesh(4, 0.0).vertices, face_mesh(4, 0.7).vertices);
    }

    #[test]
    fn test_ambient_never_negative() {
        let simulation = SimulationConfig {
            ambient_intensity: 100.0,
            ambient_swing: 500.0,
            ..SimulationConfig::default()
        };
        for step in 0..100 {
            assert!(ambient_at(&simulation, step as f64 * 0.1) >= 0.0);
        }
    }
}
