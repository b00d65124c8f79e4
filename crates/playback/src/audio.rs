//! Audio overlay scheduling.
//!
//! Overlay layers follow the same global clock as the video sequence but
//! are otherwise independent: any number of them may be bound at once,
//! they have no segment boundaries, and they are not cut off at the end
//! of the video sequence.

use std::collections::BTreeSet;

use cutline_model::{AudioLayer, LayerId};
use serde::Serialize;

use crate::backend::AudioBackend;

/// Position of one audible layer at a given global time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerPosition {
    pub id: LayerId,
    pub position: f64,
}

/// Keeps overlay layers aligned with the global playhead.
#[derive(Debug, Clone, Default)]
pub struct AudioOverlayScheduler {
    layers: Vec<AudioLayer>,
    bound: BTreeSet<LayerId>,
    running: bool,
}

impl AudioOverlayScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &[AudioLayer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&AudioLayer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub fn is_bound(&self, id: LayerId) -> bool {
        self.bound.contains(&id)
    }

    /// Register a layer. It is bound on the next [`reconcile`](Self::reconcile).
    pub fn add_layer(&mut self, layer: AudioLayer) {
        self.layers.push(layer);
    }

    /// Remove a layer, releasing its stream if bound.
    pub fn remove_layer(&mut self, id: LayerId, backend: &mut impl AudioBackend) -> Option<AudioLayer> {
        let index = self.layers.iter().position(|l| l.id() == id)?;
        if self.bound.remove(&id) {
            backend.unbind(id);
        }
        Some(self.layers.remove(index))
    }

    /// Change output level only; scheduling is unaffected.
    pub fn set_gain(&mut self, id: LayerId, gain: f64, backend: &mut impl AudioBackend) -> Option<f64> {
        let layer = self.layers.iter_mut().find(|l| l.id() == id)?;
        let applied = layer.set_gain(gain);
        if self.bound.contains(&id) {
            backend.set_gain(id, applied);
        }
        Some(applied)
    }

    /// Move a layer on the global timeline. The caller must reconcile with
    /// `repositioned = true` afterwards.
    pub fn set_offset(&mut self, id: LayerId, offset: f64) -> Option<f64> {
        let layer = self.layers.iter_mut().find(|l| l.id() == id)?;
        Some(layer.set_timeline_offset(offset))
    }

    /// All layers audible at `global_time`, in insertion order.
    pub fn active_layers(&self, global_time: f64) -> Vec<LayerPosition> {
        self.layers
            .iter()
            .filter_map(|layer| {
                layer.position_at(global_time).map(|position| LayerPosition {
                    id: layer.id(),
                    position,
                })
            })
            .collect()
    }

    /// Bring backend streams in line with the global clock.
    ///
    /// Newly active layers are bound, layers that fell out of their window
    /// are unbound, and bound layers are repositioned when the playhead
    /// jumped (`repositioned`) and started/stopped when `running` changed.
    pub fn reconcile(
        &mut self,
        global_time: f64,
        running: bool,
        repositioned: bool,
        backend: &mut impl AudioBackend,
    ) {
        for layer in &self.layers {
            let id = layer.id();
            match (layer.position_at(global_time), self.bound.contains(&id)) {
                (Some(position), false) => {
                    tracing::debug!(%id, position, "binding audio layer");
                    backend.bind(layer, position);
                    if running {
                        backend.set_running(id, true);
                    }
                    self.bound.insert(id);
                }
                (Some(position), true) => {
                    if repositioned {
                        backend.reposition(id, position);
                    }
                    if running != self.running {
                        backend.set_running(id, running);
                    }
                }
                (None, true) => {
                    tracing::debug!(%id, global_time, "audio layer left its window");
                    backend.unbind(id);
                    self.bound.remove(&id);
                }
                (None, false) => {}
            }
        }
        self.running = running;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, SimulatedBackend};

    fn layer(id: u64, duration: f64, offset: f64) -> AudioLayer {
        let mut layer = AudioLayer::new(LayerId(id), format!("track-{id}"), duration, 80.0);
        layer.set_timeline_offset(offset);
        layer
    }

    #[test]
    fn test_binds_only_active_layers() {
        let mut scheduler = AudioOverlayScheduler::new();
        let mut backend = SimulatedBackend::new();
        scheduler.add_layer(layer(1, 4.0, 3.0));
        scheduler.add_layer(layer(2, 10.0, 0.0));

        scheduler.reconcile(1.0, false, true, &mut backend);
        assert!(!scheduler.is_bound(LayerId(1)));
        assert!(scheduler.is_bound(LayerId(2)));

        scheduler.reconcile(3.5, false, true, &mut backend);
        assert!(scheduler.is_bound(LayerId(1)));
        assert_eq!(backend.layer(LayerId(1)).unwrap().position, 0.5);
    }

    #[test]
    fn test_unbinds_when_window_ends() {
        let mut scheduler = AudioOverlayScheduler::new();
        let mut backend = SimulatedBackend::new();
        scheduler.add_layer(layer(1, 4.0, 3.0));

        scheduler.reconcile(5.0, true, false, &mut backend);
        assert!(scheduler.is_bound(LayerId(1)));
        assert!(backend.layer(LayerId(1)).unwrap().running);

        scheduler.reconcile(7.0, true, false, &mut backend);
        assert!(!scheduler.is_bound(LayerId(1)));
        assert_eq!(backend.bound_layer_count(), 0);
    }

    #[test]
    fn test_running_toggles_follow_playback() {
        let mut scheduler = AudioOverlayScheduler::new();
        let mut backend = SimulatedBackend::new();
        scheduler.add_layer(layer(1, 10.0, 0.0));

        scheduler.reconcile(1.0, true, false, &mut backend);
        scheduler.reconcile(1.5, false, false, &mut backend);
        assert!(!backend.layer(LayerId(1)).unwrap().running);

        // No repeated toggles while the running state is unchanged.
        backend.take_calls();
        scheduler.reconcile(1.6, false, false, &mut backend);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_seek_repositions_every_bound_layer() {
        let mut scheduler = AudioOverlayScheduler::new();
        let mut backend = SimulatedBackend::new();
        scheduler.add_layer(layer(1, 10.0, 0.0));
        scheduler.add_layer(layer(2, 10.0, 2.0));
        scheduler.reconcile(3.0, false, true, &mut backend);
        backend.take_calls();

        scheduler.reconcile(6.0, false, true, &mut backend);
        let calls = backend.take_calls();
        assert!(calls.contains(&BackendCall::RepositionLayer {
            layer: LayerId(1),
            position: 6.0
        }));
        assert!(calls.contains(&BackendCall::RepositionLayer {
            layer: LayerId(2),
            position: 4.0
        }));
    }

    #[test]
    fn test_gain_change_does_not_reschedule() {
        let mut scheduler = AudioOverlayScheduler::new();
        let mut backend = SimulatedBackend::new();
        scheduler.add_layer(layer(1, 10.0, 0.0));
        scheduler.reconcile(1.0, true, false, &mut backend);
        backend.take_calls();

        assert_eq!(scheduler.set_gain(LayerId(1), 150.0, &mut backend), Some(100.0));
        assert_eq!(
            backend.take_calls(),
            vec![BackendCall::SetLayerGain {
                layer: LayerId(1),
                gain: 100.0
            }]
        );
        assert!(scheduler.is_bound(LayerId(1)));
    }

    #[test]
    fn test_remove_unbinds() {
        let mut scheduler = AudioOverlayScheduler::new();
        let mut backend = SimulatedBackend::new();
        scheduler.add_layer(layer(1, 10.0, 0.0));
        scheduler.reconcile(0.0, false, false, &mut backend);

        let removed = scheduler.remove_layer(LayerId(1), &mut backend).unwrap();
        assert_eq!(removed.id(), LayerId(1));
        assert_eq!(backend.bound_layer_count(), 0);
        assert!(scheduler.remove_layer(LayerId(1), &mut backend).is_none());
    }

    #[test]
    fn test_active_layers_ignore_video_length() {
        let mut scheduler = AudioOverlayScheduler::new();
        scheduler.add_layer(layer(1, 4.0, 3.0));
        scheduler.add_layer(layer(2, 100.0, 0.0));

        let active = scheduler.active_layers(50.0);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, LayerId(2));
        assert!((active[0].position - 50.0).abs() < 1e-9);
    }
}
