//! Segment types.
//!
//! A segment is one source clip placed on the timeline. Only its active
//! sub-range `[trim_start, trim_end)` contributes to the virtual timeline.

use serde::{Deserialize, Serialize};

use crate::id::SegmentId;

/// One trimmed clip on the sequential timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    id: SegmentId,

    /// Display name supplied at ingestion.
    name: String,

    /// Total decodable duration of the source, fixed at ingestion.
    source_duration: f64,

    /// Start of the active range (source-local seconds).
    trim_start: f64,

    /// End of the active range (source-local seconds).
    trim_end: f64,
}

impl Segment {
    /// Create an untrimmed segment covering its whole source.
    ///
    /// `source_duration` must be finite and positive; ingestion code is
    /// responsible for clamping collaborator input before calling this.
    pub fn new(id: SegmentId, name: impl Into<String>, source_duration: f64) -> Self {
        Self {
            id,
            name: name.into(),
            source_duration,
            trim_start: 0.0,
            trim_end: source_duration,
        }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_duration(&self) -> f64 {
        self.source_duration
    }

    pub fn trim_start(&self) -> f64 {
        self.trim_start
    }

    pub fn trim_end(&self) -> f64 {
        self.trim_end
    }

    /// Length of the active range.
    pub fn trimmed_duration(&self) -> f64 {
        self.trim_end - self.trim_start
    }

    /// Replace the active range.
    ///
    /// Callers must uphold `0 <= start < end <= source_duration`.
    pub fn set_trim(&mut self, start: f64, end: f64) {
        debug_assert!(start >= 0.0, "trim_start below zero: {start}");
        debug_assert!(start < end, "empty trim range: {start}..{end}");
        debug_assert!(
            end <= self.source_duration,
            "trim_end {end} past source duration {}",
            self.source_duration
        );
        self.trim_start = start;
        self.trim_end = end;
    }
}

/// Derived placement of a segment's active range on the global timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpan {
    pub id: SegmentId,

    /// Position of the segment in the ordered list.
    pub index: usize,

    pub global_start: f64,
    pub global_end: f64,
}

impl SegmentSpan {
    pub fn duration(&self) -> f64 {
        self.global_end - self.global_start
    }

    /// Half-open containment: the end instant belongs to the next span.
    pub fn contains(&self, global_time: f64) -> bool {
        global_time >= self.global_start && global_time < self.global_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_segment_is_untrimmed() {
        let seg = Segment::new(SegmentId(1), "intro.mp4", 12.5);
        assert_eq!(seg.trim_start(), 0.0);
        assert_eq!(seg.trim_end(), 12.5);
        assert!((seg.trimmed_duration() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_set_trim_updates_duration() {
        let mut seg = Segment::new(SegmentId(1), "a", 10.0);
        seg.set_trim(2.0, 7.5);
        assert!((seg.trimmed_duration() - 5.5).abs() < 1e-9);
        assert_eq!(seg.source_duration(), 10.0);
    }

    #[test]
    fn test_span_boundary_belongs_to_next() {
        let first = SegmentSpan {
            id: SegmentId(1),
            index: 0,
            global_start: 0.0,
            global_end: 10.0,
        };
        assert!(first.contains(0.0));
        assert!(first.contains(9.999));
        assert!(!first.contains(10.0));
        assert!((first.duration() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_segment_serialization() {
        let seg = Segment::new(SegmentId(4), "clip", 3.0);
        let json = serde_json::to_string(&seg).unwrap();
        let parsed: Segment = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, seg);
    }
}
