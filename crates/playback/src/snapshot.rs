//! Read-only views for the presentation layer.

use cutline_model::{LayerId, SegmentId};
use serde::Serialize;

use crate::audio::AudioOverlayScheduler;
use crate::binding::BoundResource;
use crate::engine::TimelineEngine;
use crate::synchronizer::PlaybackState;

/// A segment as the track view draws it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentView {
    pub id: SegmentId,
    pub name: String,
    pub source_duration: f64,
    pub trim_start: f64,
    pub trim_end: f64,
    pub global_start: f64,
    pub global_end: f64,
    pub selected: bool,
}

/// An audio layer and whether it is audible at the current time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerView {
    pub id: LayerId,
    pub name: String,
    pub source_duration: f64,
    pub gain: f64,
    pub timeline_offset: f64,
    pub active: bool,
    pub position: Option<f64>,
}

/// Everything a presentation layer polls, captured at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSnapshot {
    pub state: PlaybackState,
    pub current_time: f64,
    pub total_duration: f64,
    pub is_playing: bool,
    pub selected: Option<SegmentId>,
    pub binding: Option<BoundResource>,
    pub segments: Vec<SegmentView>,
    pub layers: Vec<LayerView>,
}

impl TimelineSnapshot {
    pub(crate) fn capture(
        state: PlaybackState,
        current_time: f64,
        selected: Option<SegmentId>,
        binding: Option<&BoundResource>,
        engine: &TimelineEngine,
        audio: &AudioOverlayScheduler,
    ) -> Self {
        let segments = engine
            .segments()
            .iter()
            .zip(engine.spans())
            .map(|(segment, span)| SegmentView {
                id: segment.id(),
                name: segment.name().to_string(),
                source_duration: segment.source_duration(),
                trim_start: segment.trim_start(),
                trim_end: segment.trim_end(),
                global_start: span.global_start,
                global_end: span.global_end,
                selected: selected == Some(segment.id()),
            })
            .collect();

        let layers = audio
            .layers()
            .iter()
            .map(|layer| {
                let position = layer.position_at(current_time);
                LayerView {
                    id: layer.id(),
                    name: layer.name().to_string(),
                    source_duration: layer.source_duration(),
                    gain: layer.gain(),
                    timeline_offset: layer.timeline_offset(),
                    active: position.is_some(),
                    position,
                }
            })
            .collect();

        Self {
            state,
            current_time,
            total_duration: engine.total_duration(),
            is_playing: state.is_playing(),
            selected,
            binding: binding.cloned(),
            segments,
            layers,
        }
    }

    pub fn segment(&self, id: SegmentId) -> Option<&SegmentView> {
        self.segments.iter().find(|s| s.id == id)
    }
}
