//! Audio overlay layer types.
//!
//! Layers are not trimmed and are not bounded by the video sequence: a
//! layer is audible whenever the global clock falls inside
//! `[timeline_offset, timeline_offset + source_duration)`.

use serde::{Deserialize, Serialize};

use crate::id::LayerId;

/// Upper bound of the normalized gain scale.
pub const MAX_GAIN: f64 = 100.0;

/// An independently timed audio overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioLayer {
    id: LayerId,
    name: String,
    source_duration: f64,

    /// Output level in `[0, 100]`.
    gain: f64,

    /// Global time at which the layer starts.
    timeline_offset: f64,
}

impl AudioLayer {
    /// Create a layer starting at global time 0.
    pub fn new(id: LayerId, name: impl Into<String>, source_duration: f64, gain: f64) -> Self {
        Self {
            id,
            name: name.into(),
            source_duration: source_duration.max(0.0),
            gain: clamp_gain(gain),
            timeline_offset: 0.0,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_duration(&self) -> f64 {
        self.source_duration
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn timeline_offset(&self) -> f64 {
        self.timeline_offset
    }

    /// Set the gain, clamped to `[0, 100]`. Returns the applied value.
    pub fn set_gain(&mut self, gain: f64) -> f64 {
        if !gain.is_nan() {
            self.gain = clamp_gain(gain);
        }
        self.gain
    }

    /// Set the start offset, clamped to be non-negative. Returns the
    /// applied value.
    pub fn set_timeline_offset(&mut self, offset: f64) -> f64 {
        if offset.is_finite() {
            self.timeline_offset = offset.max(0.0);
        }
        self.timeline_offset
    }

    /// Position inside the layer's source for a global time. May be
    /// negative or past the end; see [`AudioLayer::position_at`].
    pub fn local_position(&self, global_time: f64) -> f64 {
        global_time - self.timeline_offset
    }

    /// Local position if the layer is audible at `global_time`.
    pub fn position_at(&self, global_time: f64) -> Option<f64> {
        let local = self.local_position(global_time);
        (local >= 0.0 && local < self.source_duration).then_some(local)
    }

    pub fn is_active_at(&self, global_time: f64) -> bool {
        self.position_at(global_time).is_some()
    }
}

fn clamp_gain(gain: f64) -> f64 {
    if gain.is_nan() {
        return 0.0;
    }
    gain.clamp(0.0, MAX_GAIN)
}
