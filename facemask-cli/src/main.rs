//! facemask - drive the face overlay renderer against a simulated tracker

use anyhow::{Context, Result};
use clap::Parser;
use facemask_renderer::ar::{AnchorId, FaceAnchor, SessionObserver};
use facemask_renderer::error::SessionError;
use facemask_renderer::three_d::{LightEstimate, SceneGraph};
use facemask_renderer::FaceTrackingRenderer;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tracing::{info, warn, Level};

mod config;
mod simulator;

use simulator::{Interruption, SimulatedFaceTracker, SimulatorOptions};

#[derive(Parser)]
#[command(name = "facemask")]
#[command(about = "Face overlay renderer driven by a simulated tracker", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, env = "FACEMASK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long)]
    debug: bool,

    /// Frames to render
    #[arg(short, long, default_value = "240")]
    frames: u64,

    /// Display frame interval (ms)
    #[arg(long, default_value = "16")]
    frame_ms: u64,

    /// Toggle the material preset every N frames
    #[arg(long)]
    toggle_every: Option<u64>,

    /// Interrupt the sensor at this capture frame
    #[arg(long)]
    interrupt_at: Option<u64>,

    /// Capture frames the interruption lasts
    #[arg(long, default_value = "30")]
    interrupt_frames: u64,

    /// Pretend the device cannot track faces
    #[arg(long)]
    unsupported: bool,
}

/// Tallies the events republished to the host
#[derive(Debug, Default, Clone, Copy)]
struct EventCounts {
    added: usize,
    updated: usize,
    removed: usize,
    light_estimates: usize,
    interruptions: usize,
    failures: usize,
}

#[derive(Clone, Default)]
struct EventCounter(Rc<RefCell<EventCounts>>);

impl SessionObserver for EventCounter {
    fn on_anchor_added(&mut self, anchor: &FaceAnchor) {
        info!(anchor = %anchor.id, vertices = anchor.mesh.vertex_count(), "Face detected");
        self.0.borrow_mut().added += 1;
    }

    fn on_anchor_updated(&mut self, _anchor: &FaceAnchor) {
        self.0.borrow_mut().updated += 1;
    }

    fn on_anchor_removed(&mut self, id: AnchorId) {
        info!(anchor = %id, "Face lost");
        self.0.borrow_mut().removed += 1;
    }

    fn on_light_estimate(&mut self, _estimate: &LightEstimate) {
        self.0.borrow_mut().light_estimates += 1;
    }

    fn on_interrupted(&mut self) {
        warn!("Tracking interrupted");
        self.0.borrow_mut().interruptions += 1;
    }

    fn on_interruption_ended(&mut self) {
        info!("Tracking resumed");
    }

    fn on_failed(&mut self, reason: &str) {
        warn!(reason, "Tracking failed");
        self.0.borrow_mut().failures += 1;
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = config::load_config(cli.config.as_deref())?;
    let frame_interval = Duration::from_millis(cli.frame_ms);

    let provider = SimulatedFaceTracker::new(SimulatorOptions {
        simulation: config.simulation.clone(),
        frame_interval,
        interruption: cli.interrupt_at.map(|at_frame| Interruption {
            at_frame,
            frames: cli.interrupt_frames,
        }),
        supported: !cli.unsupported,
    });

    let mut renderer = FaceTrackingRenderer::new(Box::new(provider), config.renderer.clone())
        .context("creating renderer")?;
    let counter = EventCounter::default();
    renderer.subscribe(Box::new(counter.clone()));

    match renderer.start() {
        Ok(()) => info!(preset = %renderer.active_preset(), "Tracking started"),
        Err(SessionError::UnsupportedCapability) => {
            warn!("Face tracking is not supported on this device; nothing to overlay");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    }

    for frame in 0..cli.frames {
        let timestamp = frame as f64 * frame_interval.as_secs_f64();
        let report = renderer.tick(timestamp);

        if let Some(intensity) = report.lighting_intensity {
            tracing::debug!(frame, intensity, "Lighting updated");
        }

        if let Some(every) = cli.toggle_every.filter(|every| *every > 0) {
            if frame > 0 && frame % every == 0 {
                let preset = renderer.toggle_material_preset()?;
                info!(frame, %preset, "Preset toggled");
            }
        }

        std::thread::sleep(frame_interval);
    }

    let geometry_revision = renderer
        .overlay()
        .attached()
        .and_then(|overlay| renderer.scene().node(overlay.node_id()))
        .and_then(|node| node.geometry.as_ref())
        .map(|geometry| geometry.revision());
    renderer.stop();

    let counts = *counter.0.borrow();
    info!(
        frames = renderer.frame_count(),
        state = ?renderer.session_state(),
        preset = %renderer.active_preset(),
        lighting = renderer.scene().lighting().intensity,
        added = counts.added,
        updated = counts.updated,
        removed = counts.removed,
        light_estimates = counts.light_estimates,
        interruptions = counts.interruptions,
        failures = counts.failures,
        ?geometry_revision,
        "Session summary"
    );

    Ok(())
}
