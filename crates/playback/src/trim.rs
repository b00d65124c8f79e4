//! Trim bound mutation under clamping invariants.
//!
//! Trimming never fails: proposals are clamped so that every segment keeps
//! at least `min_length` seconds of active range inside its source.

use cutline_model::{Segment, SegmentId, SegmentSpan};

use crate::engine::TimelineEngine;

/// Smallest active range a segment can be trimmed to, whatever the
/// configured minimum.
pub const MIN_TRIM_FLOOR_SECS: f64 = 1e-3;

/// A segment removed from the timeline, with where it used to be.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedSegment {
    pub index: usize,
    pub segment: Segment,
    pub span: SegmentSpan,
}

/// Applies trim and removal edits to a [`TimelineEngine`].
#[derive(Debug, Clone, Copy)]
pub struct TrimController {
    min_length: f64,
}

impl Default for TrimController {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl TrimController {
    /// Lengths below [`MIN_TRIM_FLOOR_SECS`] (and NaN) are raised to it.
    pub fn new(min_length: f64) -> Self {
        Self {
            min_length: min_length.max(MIN_TRIM_FLOOR_SECS),
        }
    }

    pub fn min_length(&self) -> f64 {
        self.min_length
    }

    /// Move the start of the active range. Returns the applied value, or
    /// `None` if the segment does not exist.
    pub fn set_trim_start(
        &self,
        engine: &mut TimelineEngine,
        id: SegmentId,
        proposed: f64,
    ) -> Option<f64> {
        let min_length = self.min_length;
        engine.update(id, |seg| {
            if proposed.is_nan() {
                return seg.trim_start();
            }
            let start = proposed.min(seg.trim_end() - min_length).max(0.0);
            seg.set_trim(start, seg.trim_end());
            start
        })
    }

    /// Move the end of the active range. Returns the applied value, or
    /// `None` if the segment does not exist.
    pub fn set_trim_end(
        &self,
        engine: &mut TimelineEngine,
        id: SegmentId,
        proposed: f64,
    ) -> Option<f64> {
        let min_length = self.min_length;
        engine.update(id, |seg| {
            if proposed.is_nan() {
                return seg.trim_end();
            }
            let end = proposed
                .max(seg.trim_start() + min_length)
                .min(seg.source_duration());
            seg.set_trim(seg.trim_start(), end);
            end
        })
    }

    /// Delete a segment from the timeline.
    pub fn remove_segment(&self, engine: &mut TimelineEngine, id: SegmentId) -> Option<RemovedSegment> {
        engine
            .take(id)
            .map(|(index, segment, span)| RemovedSegment {
                index,
                segment,
                span,
            })
    }
}
