//! Playback primitive seams.
//!
//! The core never decodes media. It talks to whatever owns the real
//! playback primitives through [`MediaBackend`] (exactly one video stream)
//! and [`AudioBackend`] (any number of overlay streams). Completions and
//! progress come back as [`PlaybackEvent`]s.

use std::collections::BTreeMap;

use cutline_model::{AudioLayer, LayerId, SegmentId};
use serde::{Deserialize, Serialize};

use crate::event::{LoadOutcome, PlaybackEvent};

/// Tag identifying one load request. Strictly increasing per synchronizer,
/// so a completion can be matched against the request it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Ask the video primitive to load a segment's source positioned at
/// `local_time`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadRequest {
    pub id: RequestId,
    pub segment_id: SegmentId,
    pub local_time: f64,
}

/// The single-stream video playback primitive.
pub trait MediaBackend {
    /// Start loading a source. Fire-and-forget: the outcome must be
    /// reported later as [`PlaybackEvent::LoadCompleted`] with the same id.
    fn load(&mut self, request: &LoadRequest);

    /// Reposition the loaded source (source-local seconds).
    fn seek_to(&mut self, local_time: f64);

    fn play(&mut self);

    fn pause(&mut self);

    /// Release the loaded source.
    fn unload(&mut self);
}

/// Concurrent audio overlay primitives, one stream per layer.
pub trait AudioBackend {
    /// Load a layer's source positioned at `position`, paused.
    fn bind(&mut self, layer: &AudioLayer, position: f64);

    fn unbind(&mut self, layer: LayerId);

    fn reposition(&mut self, layer: LayerId, position: f64);

    fn set_running(&mut self, layer: LayerId, running: bool);

    fn set_gain(&mut self, layer: LayerId, gain: f64);
}

/// Every call made against a [`SimulatedBackend`], in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum BackendCall {
    Load { request: LoadRequest },
    SeekTo { local_time: f64 },
    Play,
    Pause,
    Unload,
    BindLayer { layer: LayerId, position: f64 },
    UnbindLayer { layer: LayerId },
    RepositionLayer { layer: LayerId, position: f64 },
    SetLayerRunning { layer: LayerId, running: bool },
    SetLayerGain { layer: LayerId, gain: f64 },
}

/// State of one simulated overlay stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulatedLayer {
    pub position: f64,
    pub running: bool,
    pub gain: f64,
}

/// In-memory stand-in for the real playback primitives.
///
/// Records every call and models the video position so callers can feed
/// realistic progress ticks back into the synchronizer. Loads stay pending
/// until [`SimulatedBackend::complete_load`] is called, which makes stale
/// and failed completions easy to reproduce.
#[derive(Debug, Default)]
pub struct SimulatedBackend {
    calls: Vec<BackendCall>,
    pending: Option<LoadRequest>,
    loaded: Option<RequestId>,
    position: f64,
    running: bool,
    layers: BTreeMap<LayerId, SimulatedLayer>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of load requests issued so far.
    pub fn load_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Load { .. }))
            .count()
    }

    /// Most recent load that has not been completed yet.
    pub fn pending_load(&self) -> Option<&LoadRequest> {
        self.pending.as_ref()
    }

    /// Request whose source is currently loaded.
    pub fn loaded_request(&self) -> Option<RequestId> {
        self.loaded
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn layer(&self, id: LayerId) -> Option<&SimulatedLayer> {
        self.layers.get(&id)
    }

    pub fn bound_layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Finish the pending load and produce the completion event to feed
    /// back into the synchronizer.
    pub fn complete_load(&mut self, outcome: LoadOutcome) -> Option<PlaybackEvent> {
        let request = self.pending.take()?;
        if matches!(outcome, LoadOutcome::Ready) {
            self.loaded = Some(request.id);
            self.position = request.local_time;
        }
        Some(PlaybackEvent::LoadCompleted {
            request: request.id,
            outcome,
        })
    }

    /// Let `elapsed` seconds pass. Running streams move forward; returns
    /// the progress tick of the video stream if one is loaded.
    pub fn advance(&mut self, elapsed: f64) -> Option<PlaybackEvent> {
        for layer in self.layers.values_mut().filter(|l| l.running) {
            layer.position += elapsed;
        }
        let request = self.loaded?;
        if self.running {
            self.position += elapsed;
        }
        Some(PlaybackEvent::Progress {
            request,
            local_time: self.position,
        })
    }

    /// Run the video stream off the end of its source. Real decoders often
    /// stop reporting progress a little before the last frame.
    pub fn end(&mut self) -> Option<PlaybackEvent> {
        let request = self.loaded?;
        self.running = false;
        Some(PlaybackEvent::Ended { request })
    }

    /// Jump the video stream without the synchronizer asking, as a stalled
    /// or misbehaving decoder would.
    pub fn force_position(&mut self, local_time: f64) {
        self.position = local_time;
    }
}

impl MediaBackend for SimulatedBackend {
    fn load(&mut self, request: &LoadRequest) {
        self.calls.push(BackendCall::Load {
            request: request.clone(),
        });
        self.pending = Some(request.clone());
        self.loaded = None;
        self.running = false;
    }

    fn seek_to(&mut self, local_time: f64) {
        self.calls.push(BackendCall::SeekTo { local_time });
        self.position = local_time;
    }

    fn play(&mut self) {
        self.calls.push(BackendCall::Play);
        self.running = true;
    }

    fn pause(&mut self) {
        self.calls.push(BackendCall::Pause);
        self.running = false;
    }

    fn unload(&mut self) {
        self.calls.push(BackendCall::Unload);
        self.pending = None;
        self.loaded = None;
        self.running = false;
    }
}

impl AudioBackend for SimulatedBackend {
    fn bind(&mut self, layer: &AudioLayer, position: f64) {
        self.calls.push(BackendCall::BindLayer {
            layer: layer.id(),
            position,
        });
        self.layers.insert(
            layer.id(),
            SimulatedLayer {
                position,
                running: false,
                gain: layer.gain(),
            },
        );
    }

    fn unbind(&mut self, layer: LayerId) {
        self.calls.push(BackendCall::UnbindLayer { layer });
        self.layers.remove(&layer);
    }

    fn reposition(&mut self, layer: LayerId, position: f64) {
        self.calls
            .push(BackendCall::RepositionLayer { layer, position });
        if let Some(state) = self.layers.get_mut(&layer) {
            state.position = position;
        }
    }

    fn set_running(&mut self, layer: LayerId, running: bool) {
        self.calls
            .push(BackendCall::SetLayerRunning { layer, running });
        if let Some(state) = self.layers.get_mut(&layer) {
            state.running = running;
        }
    }

    fn set_gain(&mut self, layer: LayerId, gain: f64) {
        self.calls.push(BackendCall::SetLayerGain { layer, gain });
        if let Some(state) = self.layers.get_mut(&layer) {
            state.gain = gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: u64, local: f64) -> LoadRequest {
        LoadRequest {
            id: RequestId(id),
            segment_id: SegmentId(1),
            local_time: local,
        }
    }

    #[test]
    fn test_load_stays_pending_until_completed() {
        let mut backend = SimulatedBackend::new();
        backend.load(&request(1, 2.0));
        assert!(backend.loaded_request().is_none());
        assert!(backend.advance(1.0).is_none());

        let event = backend.complete_load(LoadOutcome::Ready).unwrap();
        assert_eq!(
            event,
            PlaybackEvent::LoadCompleted {
                request: RequestId(1),
                outcome: LoadOutcome::Ready
            }
        );
        assert_eq!(backend.loaded_request(), Some(RequestId(1)));
        assert_eq!(backend.position(), 2.0);
    }

    #[test]
    fn test_advance_moves_only_when_running() {
        let mut backend = SimulatedBackend::new();
        backend.load(&request(1, 0.0));
        backend.complete_load(LoadOutcome::Ready);

        backend.advance(1.0);
        assert_eq!(backend.position(), 0.0);

        backend.play();
        let tick = backend.advance(0.25).unwrap();
        assert_eq!(
            tick,
            PlaybackEvent::Progress {
                request: RequestId(1),
                local_time: 0.25
            }
        );
    }

    #[test]
    fn test_end_stops_the_loaded_stream() {
        let mut backend = SimulatedBackend::new();
        assert!(backend.end().is_none());

        backend.load(&request(2, 0.0));
        backend.complete_load(LoadOutcome::Ready);
        backend.play();
        assert_eq!(
            backend.end(),
            Some(PlaybackEvent::Ended {
                request: RequestId(2)
            })
        );
        assert!(!backend.is_running());
    }

    #[test]
    fn test_failed_load_leaves_nothing_loaded() {
        let mut backend = SimulatedBackend::new();
        backend.load(&request(3, 0.0));
        backend.complete_load(LoadOutcome::Failed {
            reason: "codec".to_string(),
        });
        assert!(backend.loaded_request().is_none());
        assert!(backend.pending_load().is_none());
    }

    #[test]
    fn test_layers_are_tracked_independently() {
        let mut backend = SimulatedBackend::new();
        let a = AudioLayer::new(LayerId(1), "a", 10.0, 50.0);
        let b = AudioLayer::new(LayerId(2), "b", 10.0, 70.0);
        backend.bind(&a, 0.0);
        backend.bind(&b, 2.0);
        backend.set_running(LayerId(2), true);
        backend.advance(1.0);

        assert_eq!(backend.bound_layer_count(), 2);
        assert_eq!(backend.layer(LayerId(1)).unwrap().position, 0.0);
        assert_eq!(backend.layer(LayerId(2)).unwrap().position, 3.0);
    }
}
