//! Face-tracking session management
//!
//! The tracking provider produces events on its own capture thread. They go
//! through a [`SensorEventSender`] into a single-consumer queue which is only
//! drained on the render thread by [`TrackingSessionManager::pump`]. Pumping
//! applies the session state machine and republishes the surviving events,
//! in delivery order, to the subscribed observers and to the caller.

use crate::ar::{AnchorId, FaceAnchor};
use crate::config::FaceTrackingConfig;
use crate::error::{Result, SessionError};
use crate::three_d::LightEstimate;
use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Tracking session state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackingSessionState {
    /// Not running
    #[default]
    Idle,
    /// Producing tracking data
    Running,
    /// Temporarily without sensor data
    Interrupted,
    /// Stopped by an unrecoverable sensor error
    Failed,
}

/// Options for a provider run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Restart tracking from scratch
    pub reset_tracking: bool,
    /// Drop every anchor of the previous run
    pub remove_existing_anchors: bool,
}

impl RunOptions {
    /// Full re-arm: fresh tracking, no leftover anchors
    pub const RESET: RunOptions = RunOptions {
        reset_tracking: true,
        remove_existing_anchors: true,
    };
}

/// Raw event produced by a tracking provider
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    /// A face was detected
    AnchorAdded(FaceAnchor),
    /// A tracked face moved or deformed
    AnchorUpdated(FaceAnchor),
    /// A face is no longer tracked
    AnchorRemoved(AnchorId),
    /// A camera frame was processed
    Frame {
        /// Capture time in seconds
        timestamp: f64,
        /// Ambient light estimate, when light estimation is on
        light_estimate: Option<LightEstimate>,
    },
    /// Sensor data stopped arriving (camera in use, app in background...)
    Interrupted,
    /// Sensor data is flowing again
    InterruptionEnded,
    /// The provider hit an unrecoverable error
    Failed {
        /// Provider's description of the failure
        reason: String,
    },
}

/// Event republished on the render thread
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A face anchor appeared
    AnchorAdded(FaceAnchor),
    /// The live face anchor changed
    AnchorUpdated(FaceAnchor),
    /// The live face anchor went away
    AnchorRemoved(AnchorId),
    /// Light estimate for the current frame
    LightEstimate(LightEstimate),
    /// The session was interrupted
    Interrupted,
    /// The session resumed after an interruption
    InterruptionEnded,
    /// The session failed
    Failed(String),
}

impl SessionEvent {
    /// Invoke the observer callback matching this event
    pub fn dispatch(&self, observer: &mut dyn SessionObserver) {
        match self {
            SessionEvent::AnchorAdded(anchor) => observer.on_anchor_added(anchor),
            SessionEvent::AnchorUpdated(anchor) => observer.on_anchor_updated(anchor),
            SessionEvent::AnchorRemoved(id) => observer.on_anchor_removed(*id),
            SessionEvent::LightEstimate(estimate) => observer.on_light_estimate(estimate),
            SessionEvent::Interrupted => observer.on_interrupted(),
            SessionEvent::InterruptionEnded => observer.on_interruption_ended(),
            SessionEvent::Failed(reason) => observer.on_failed(reason),
        }
    }
}

/// Receives republished session events on the render thread
pub trait SessionObserver {
    /// A face anchor appeared
    fn on_anchor_added(&mut self, _anchor: &FaceAnchor) {}

    /// The live face anchor changed
    fn on_anchor_updated(&mut self, _anchor: &FaceAnchor) {}

    /// The live face anchor went away
    fn on_anchor_removed(&mut self, _id: AnchorId) {}

    /// Light estimate for the current frame
    fn on_light_estimate(&mut self, _estimate: &LightEstimate) {}

    /// The session was interrupted
    fn on_interrupted(&mut self) {}

    /// The session resumed after an interruption
    fn on_interruption_ended(&mut self) {}

    /// The session failed
    fn on_failed(&mut self, _reason: &str) {}
}

#[derive(Debug)]
struct QueuedEvent {
    generation: u64,
    event: SensorEvent,
}

/// Queue handle given to the provider for one run.
///
/// Safe to move to the provider's capture thread. Events sent through a
/// handle from an earlier run are discarded once the session has been
/// stopped or reset.
#[derive(Debug, Clone)]
pub struct SensorEventSender {
    generation: u64,
    tx: Sender<QueuedEvent>,
}

impl SensorEventSender {
    /// Queue an event. Returns false once the session manager is gone.
    pub fn send(&self, event: SensorEvent) -> bool {
        self.tx
            .send(QueuedEvent {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    /// Run this handle belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The external face-tracking subsystem
pub trait FaceTrackingProvider {
    /// Whether this device can track faces at all
    fn is_face_tracking_supported(&self) -> bool;

    /// Start or restart producing events into `events`. Returns immediately.
    fn run(&mut self, config: &FaceTrackingConfig, options: RunOptions, events: SensorEventSender);

    /// Stop producing events and release sensor resources
    fn pause(&mut self);
}

/// Owns the tracking session state machine
pub struct TrackingSessionManager {
    provider: Box<dyn FaceTrackingProvider>,
    config: FaceTrackingConfig,
    state: TrackingSessionState,
    generation: u64,
    tx: Sender<QueuedEvent>,
    rx: Receiver<QueuedEvent>,
    live_anchor: Option<AnchorId>,
    /// Events raised on the render thread, delivered ahead of the queue
    pending: VecDeque<SessionEvent>,
    light_estimate: Option<LightEstimate>,
    last_frame_timestamp: Option<f64>,
    last_error: Option<SessionError>,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl TrackingSessionManager {
    /// Create an idle session around a provider
    pub fn new(provider: Box<dyn FaceTrackingProvider>) -> Self {
        Self::with_config(provider, FaceTrackingConfig::default())
    }

    /// Create an idle session that runs under `config` until a start says otherwise
    pub fn with_config(provider: Box<dyn FaceTrackingProvider>, config: FaceTrackingConfig) -> Self {
        let (tx, rx) = channel::unbounded();
        Self {
            provider,
            config,
            state: TrackingSessionState::Idle,
            generation: 0,
            tx,
            rx,
            live_anchor: None,
            pending: VecDeque::new(),
            light_estimate: None,
            last_frame_timestamp: None,
            last_error: None,
            observers: Vec::new(),
        }
    }

    /// Start tracking under `config`.
    ///
    /// Does nothing if the session is already running or interrupted.
    /// Every run starts from scratch: anchors from before a stop or a
    /// failure are never resumed.
    pub fn start(&mut self, config: FaceTrackingConfig) -> Result<()> {
        self.check_supported()?;
        config.validate()?;

        if matches!(self.state, TrackingSessionState::Running | TrackingSessionState::Interrupted) {
            debug!("Tracking session already started");
            return Ok(());
        }

        self.config = config;
        self.begin_run(RunOptions::RESET);
        Ok(())
    }

    /// Restart tracking, discarding every existing anchor.
    ///
    /// A live anchor is reported removed before any event of the new run.
    pub fn reset(&mut self) -> Result<()> {
        self.check_supported()?;
        self.config.validate()?;

        if let Some(id) = self.live_anchor.take() {
            debug!("Discarding anchor {} on reset", id);
            self.pending.push_back(SessionEvent::AnchorRemoved(id));
        }
        self.begin_run(RunOptions::RESET);
        Ok(())
    }

    /// Stop tracking and release the sensor. Idempotent.
    ///
    /// No observer callback fires after this returns until the next start.
    pub fn stop(&mut self) {
        if self.state == TrackingSessionState::Idle {
            return;
        }

        self.provider.pause();
        self.generation += 1;
        self.discard_queued();
        self.pending.clear();
        self.live_anchor = None;
        self.light_estimate = None;
        self.last_error = None;
        self.transition(TrackingSessionState::Idle);
    }

    /// Drain queued sensor events, apply them to the state machine and
    /// republish the result in delivery order.
    ///
    /// Must be called on the render thread. Observers run before this returns.
    pub fn pump(&mut self) -> Vec<SessionEvent> {
        let mut delivered: Vec<SessionEvent> = self.pending.drain(..).collect();

        // Bounded so a fast producer cannot starve the frame
        let available = self.rx.len();
        for _ in 0..available {
            let Ok(queued) = self.rx.try_recv() else {
                break;
            };
            if queued.generation != self.generation {
                debug!("Dropping event from stale run {}", queued.generation);
                continue;
            }
            self.process(queued.event, &mut delivered);
        }

        for event in &delivered {
            for observer in self.observers.iter_mut() {
                event.dispatch(observer.as_mut());
            }
        }

        delivered
    }

    fn process(&mut self, event: SensorEvent, out: &mut Vec<SessionEvent>) {
        match self.state {
            TrackingSessionState::Running => self.process_running(event, out),
            TrackingSessionState::Interrupted => self.process_interrupted(event, out),
            TrackingSessionState::Idle | TrackingSessionState::Failed => {
                debug!("Dropping sensor event while {:?}", self.state);
            }
        }
    }

    fn process_running(&mut self, event: SensorEvent, out: &mut Vec<SessionEvent>) {
        match event {
            SensorEvent::AnchorAdded(anchor) => {
                if let Err(err) = anchor.mesh.validate() {
                    warn!("Dropping new anchor {}: {}", anchor.id, err);
                    return;
                }
                match self.live_anchor {
                    Some(id) if id == anchor.id => {
                        debug!("Anchor {} added twice, treating as update", id);
                        out.push(SessionEvent::AnchorUpdated(anchor));
                    }
                    Some(previous) => {
                        debug!("Anchor {} replaces {}", anchor.id, previous);
                        out.push(SessionEvent::AnchorRemoved(previous));
                        self.live_anchor = Some(anchor.id);
                        out.push(SessionEvent::AnchorAdded(anchor));
                    }
                    None => {
                        debug!("Anchor {} added", anchor.id);
                        self.live_anchor = Some(anchor.id);
                        out.push(SessionEvent::AnchorAdded(anchor));
                    }
                }
            }
            SensorEvent::AnchorUpdated(anchor) => {
                if self.live_anchor != Some(anchor.id) {
                    warn!("{}", SessionError::GeometryMismatch { anchor: anchor.id });
                    return;
                }
                if let Err(err) = anchor.mesh.validate() {
                    warn!("Dropping update for anchor {}: {}", anchor.id, err);
                    return;
                }
                out.push(SessionEvent::AnchorUpdated(anchor));
            }
            SensorEvent::AnchorRemoved(id) => self.remove_anchor(id, out),
            SensorEvent::Frame {
                timestamp,
                light_estimate,
            } => {
                self.last_frame_timestamp = Some(timestamp);
                if let Some(estimate) = light_estimate {
                    self.light_estimate = Some(estimate);
                    out.push(SessionEvent::LightEstimate(estimate));
                }
            }
            SensorEvent::Interrupted => {
                // Tracking is lost for the whole interruption
                self.discard_live_anchor(out);
                self.last_error = Some(SessionError::SensorInterrupted);
                self.transition(TrackingSessionState::Interrupted);
                out.push(SessionEvent::Interrupted);
            }
            SensorEvent::InterruptionEnded => {
                debug!("Interruption end without interruption");
            }
            SensorEvent::Failed { reason } => self.fail(reason, out),
        }
    }

    fn process_interrupted(&mut self, event: SensorEvent, out: &mut Vec<SessionEvent>) {
        match event {
            SensorEvent::InterruptionEnded => {
                self.last_error = None;
                self.transition(TrackingSessionState::Running);
                out.push(SessionEvent::InterruptionEnded);
            }
            SensorEvent::Failed { reason } => self.fail(reason, out),
            SensorEvent::AnchorRemoved(id) => self.remove_anchor(id, out),
            SensorEvent::Interrupted => {}
            other => debug!("Dropping {} while interrupted", kind(&other)),
        }
    }

    fn remove_anchor(&mut self, id: AnchorId, out: &mut Vec<SessionEvent>) {
        if self.live_anchor == Some(id) {
            debug!("Anchor {} removed", id);
            self.live_anchor = None;
            out.push(SessionEvent::AnchorRemoved(id));
        } else {
            debug!("Ignoring removal of unknown anchor {}", id);
        }
    }

    fn discard_live_anchor(&mut self, out: &mut Vec<SessionEvent>) {
        if let Some(id) = self.live_anchor.take() {
            debug!("Discarding anchor {}", id);
            out.push(SessionEvent::AnchorRemoved(id));
        }
    }

    fn fail(&mut self, reason: String, out: &mut Vec<SessionEvent>) {
        warn!("Tracking session failed: {}", reason);
        self.discard_live_anchor(out);
        self.last_error = Some(SessionError::SensorFailed { reason: reason.clone() });
        self.transition(TrackingSessionState::Failed);
        out.push(SessionEvent::Failed(reason));
    }

    fn begin_run(&mut self, options: RunOptions) {
        self.generation += 1;
        self.discard_queued();
        self.light_estimate = None;
        self.last_error = None;

        let sender = SensorEventSender {
            generation: self.generation,
            tx: self.tx.clone(),
        };
        self.provider.run(&self.config, options, sender);
        self.transition(TrackingSessionState::Running);
    }

    fn check_supported(&mut self) -> Result<()> {
        if self.provider.is_face_tracking_supported() {
            return Ok(());
        }
        warn!("Face tracking is not supported on this device");
        self.last_error = Some(SessionError::UnsupportedCapability);
        Err(SessionError::UnsupportedCapability)
    }

    fn discard_queued(&mut self) {
        let dropped = self.rx.try_iter().count();
        if dropped > 0 {
            debug!("Discarded {} queued sensor events", dropped);
        }
    }

    fn transition(&mut self, next: TrackingSessionState) {
        if self.state != next {
            info!("Tracking session {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Take this frame's light estimate, leaving none behind
    pub fn take_light_estimate(&mut self) -> Option<LightEstimate> {
        self.light_estimate.take()
    }

    /// Register an observer for republished events
    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    /// Current state
    pub fn state(&self) -> TrackingSessionState {
        self.state
    }

    /// Identity of the live face anchor
    pub fn live_anchor(&self) -> Option<AnchorId> {
        self.live_anchor
    }

    /// Most recent error surfaced to the host
    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// Timestamp of the last processed sensor frame
    pub fn last_frame_timestamp(&self) -> Option<f64> {
        self.last_frame_timestamp
    }

    /// Configuration of the current run
    pub fn config(&self) -> &FaceTrackingConfig {
        &self.config
    }

    /// Current run number
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn kind(event: &SensorEvent) -> &'static str {
    match event {
        SensorEvent::AnchorAdded(_) => "anchor added",
        SensorEvent::AnchorUpdated(_) => "anchor updated",
        SensorEvent::AnchorRemoved(_) => "anchor removed",
        SensorEvent::Frame { .. } => "frame",
        SensorEvent::Interrupted => "interruption",
        SensorEvent::InterruptionEnded => "interruption end",
        SensorEvent::Failed { .. } => "failure",
    }
}
