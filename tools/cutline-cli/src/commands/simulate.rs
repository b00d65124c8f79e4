//! Replay a script against a simulated backend.

use std::path::PathBuf;

use cutline_common::clock::{format_timecode, wall_clock_now};
use cutline_common::config::{AppConfig, PlaybackConfig};
use cutline_playback::snapshot::TimelineSnapshot;
use cutline_playback::{
    BindingStatus, LoadOutcome, MediaBackend, Notification, PlaybackEvent, PlaybackSynchronizer,
    SimulatedBackend,
};
use serde::Serialize;

use crate::script::{Script, Step};

/// Tick interval used when a command does not ask for one.
pub const DEFAULT_TICK_SECS: f64 = 0.25;

/// Load completions handled per step before giving up on a backend that
/// keeps being asked to rebind.
const MAX_LOAD_ROUNDS: usize = 16;

/// A notification together with the playhead position it was raised at.
#[derive(Debug, Clone, Serialize)]
pub struct TimedNotification {
    pub at: f64,
    #[serde(flatten)]
    pub notification: Notification,
}

#[derive(Serialize)]
struct SimulationReport<'a> {
    generated_at: String,
    script: Option<&'a str>,
    steps: usize,
    notifications: &'a [TimedNotification],
    snapshots: &'a [TimelineSnapshot],
    final_state: TimelineSnapshot,
}

/// A synchronizer wired to a [`SimulatedBackend`] that completes loads as
/// soon as they are issued and emits progress as time advances.
pub struct Simulation {
    sync: PlaybackSynchronizer<SimulatedBackend>,
    tick: f64,
    skip: f64,
    fail_next: Option<String>,
    notifications: Vec<TimedNotification>,
    snapshots: Vec<TimelineSnapshot>,
}

impl Simulation {
    pub fn new(config: &PlaybackConfig, tick: f64) -> Self {
        Self {
            sync: PlaybackSynchronizer::with_config(SimulatedBackend::new(), config.clone()),
            tick,
            skip: config.skip_secs,
            fail_next: None,
            notifications: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    pub fn sync(&self) -> &PlaybackSynchronizer<SimulatedBackend> {
        &self.sync
    }

    pub fn notifications(&self) -> &[TimedNotification] {
        &self.notifications
    }

    pub fn snapshots(&self) -> &[TimelineSnapshot] {
        &self.snapshots
    }

    pub fn apply(&mut self, step: &Step) {
        match step {
            Step::Event(event) => self.sync.submit(event.clone()),
            Step::SkipForward => self.sync.submit(PlaybackEvent::Skip { seconds: self.skip }),
            Step::SkipBackward => self.sync.submit(PlaybackEvent::Skip {
                seconds: -self.skip,
            }),
            Step::FailNextLoad(reason) => self.fail_next = Some(reason.clone()),
            Step::Advance(secs) => self.advance(*secs),
            Step::Snapshot => self.snapshots.push(self.sync.snapshot()),
        }
        self.sync.run_pending();
        self.complete_loads();
        self.collect();
    }

    pub fn run(&mut self, script: &Script) {
        for step in &script.steps {
            self.apply(step);
        }
    }

    fn advance(&mut self, secs: f64) {
        let mut remaining = secs;
        while remaining > 1e-9 {
            let elapsed = self.tick.min(remaining);
            if let Some(event) = self.sync.backend_mut().advance(elapsed) {
                self.sync.dispatch(event);
            }
            self.complete_loads();
            self.collect();
            remaining -= elapsed;
        }
    }

    fn complete_loads(&mut self) {
        let mut rounds = 0;
        while self.sync.backend().pending_load().is_some() {
            if rounds == MAX_LOAD_ROUNDS {
                tracing::warn!(rounds, "load completions did not settle, dropping pending load");
                self.sync.backend_mut().unload();
                return;
            }
            rounds += 1;

            let outcome = match self.fail_next.take() {
                Some(reason) => LoadOutcome::Failed { reason },
                None => LoadOutcome::Ready,
            };
            if let Some(event) = self.sync.backend_mut().complete_load(outcome) {
                self.sync.dispatch(event);
            }
        }
    }

    fn collect(&mut self) {
        let at = self.sync.current_time();
        self.notifications.extend(
            self.sync
                .drain_notifications()
                .into_iter()
                .map(|notification| TimedNotification { at, notification }),
        );
    }
}

pub fn run(path: PathBuf, tick: f64, json: bool, config: &AppConfig) -> anyhow::Result<()> {
    anyhow::ensure!(
        tick.is_finite() && tick > 0.0,
        "tick must be a positive number of seconds"
    );

    let script =
        Script::load(&path).map_err(|e| anyhow::anyhow!("Failed to load script: {e}"))?;

    let mut simulation = Simulation::new(&config.playback, tick);
    simulation.run(&script);
    tracing::info!(
        steps = script.steps.len(),
        notifications = simulation.notifications().len(),
        "simulation finished"
    );

    let final_state = simulation.sync().snapshot();
    if json {
        let report = SimulationReport {
            generated_at: wall_clock_now(),
            script: script.name.as_deref(),
            steps: script.steps.len(),
            notifications: simulation.notifications(),
            snapshots: simulation.snapshots(),
            final_state,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Simulating script at: {}", path.display());
    if let Some(name) = &script.name {
        println!("  Name: {name}");
    }
    println!("  Steps: {}", script.steps.len());
    println!();

    println!("Notifications:");
    if simulation.notifications().is_empty() {
        println!("  (none)");
    }
    for timed in simulation.notifications() {
        println!(
            "  [{}] {}",
            format_timecode(timed.at),
            describe(&timed.notification)
        );
    }

    for (index, snapshot) in simulation.snapshots().iter().enumerate() {
        println!();
        println!("Snapshot #{}:", index + 1);
        print_snapshot(snapshot);
    }

    println!();
    println!("Final state:");
    print_snapshot(&final_state);
    Ok(())
}

fn describe(notification: &Notification) -> String {
    match notification {
        Notification::SegmentChanged { from: Some(from), to } => {
            format!("segment {from} -> {to}")
        }
        Notification::SegmentChanged { from: None, to } => format!("segment bound: {to}"),
        Notification::DriftCorrected {
            segment,
            expected,
            reported,
        } => format!("drift corrected on {segment}: expected {expected:.3}s, reported {reported:.3}s"),
        Notification::BindingFailed { error } => format!("binding failed: {error}"),
        Notification::EndOfSequence => "end of sequence".to_string(),
    }
}

fn print_snapshot(snapshot: &TimelineSnapshot) {
    println!("  State: {:?}", snapshot.state);
    println!(
        "  Time: {:.3}s / {:.3}s ({})",
        snapshot.current_time,
        snapshot.total_duration,
        format_timecode(snapshot.current_time)
    );

    println!("  Segments: {}", snapshot.segments.len());
    for seg in &snapshot.segments {
        println!(
            "    {} {} [{:.3}-{:.3} of {:.3}s] at {:.3}-{:.3}{}",
            seg.id,
            seg.name,
            seg.trim_start,
            seg.trim_end,
            seg.source_duration,
            seg.global_start,
            seg.global_end,
            if seg.selected { " (selected)" } else { "" }
        );
    }

    if !snapshot.layers.is_empty() {
        println!("  Audio layers: {}", snapshot.layers.len());
        for layer in &snapshot.layers {
            let position = match layer.position {
                Some(p) => format!("playing at {p:.3}s"),
                None => "silent".to_string(),
            };
            println!(
                "    {} {} gain {:.0} offset {:.3}s, {}",
                layer.id, layer.name, layer.gain, layer.timeline_offset, position
            );
        }
    }

    match &snapshot.binding {
        Some(binding) => {
            let status = match binding.status {
                BindingStatus::Loading => "loading",
                BindingStatus::Ready => "ready",
                BindingStatus::Failed => "failed",
            };
            println!(
                "  Binding: {} {} at {:.3}s ({status})",
                binding.segment_id(),
                binding.request_id(),
                binding.request.local_time
            );
        }
        None => println!("  Binding: none"),
    }
}
