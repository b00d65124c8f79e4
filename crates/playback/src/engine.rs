//! Virtual timeline mapping.
//!
//! The engine holds the ordered segment list together with the derived
//! [`SegmentSpan`]s. Every mutation goes through a method that recomputes
//! the spans, so the spans and total duration are always current.

use cutline_model::{Segment, SegmentId, SegmentSpan};
use serde::Serialize;

/// Result of mapping a global time onto the segment list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolved {
    /// Index of the segment in the ordered list.
    pub index: usize,
    pub segment_id: SegmentId,
    /// Position within the segment's source (includes `trim_start`).
    pub local_time: f64,
    /// Global start of the resolved segment's active range.
    pub global_start: f64,
}

/// Owns the segment order and answers global↔local time queries.
#[derive(Debug, Clone, Default)]
pub struct TimelineEngine {
    segments: Vec<Segment>,
    spans: Vec<SegmentSpan>,
    total: f64,
}

impl TimelineEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine over an existing ordered list.
    pub fn with_segments(segments: Vec<Segment>) -> Self {
        let mut engine = Self {
            segments,
            spans: Vec::new(),
            total: 0.0,
        };
        engine.recompute();
        engine
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn spans(&self) -> &[SegmentSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sum of all active ranges; 0 for an empty list.
    pub fn total_duration(&self) -> f64 {
        self.total
    }

    /// Append a segment at the end of the timeline.
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
        self.recompute();
    }

    /// Remove a segment, returning it with its former index and span.
    pub(crate) fn take(&mut self, id: SegmentId) -> Option<(usize, Segment, SegmentSpan)> {
        let index = self.index_of(id)?;
        let span = self.spans[index];
        let segment = self.segments.remove(index);
        self.recompute();
        Some((index, segment, span))
    }

    /// Mutate one segment in place; spans are recomputed afterwards.
    pub(crate) fn update<R>(&mut self, id: SegmentId, f: impl FnOnce(&mut Segment) -> R) -> Option<R> {
        let index = self.index_of(id)?;
        let result = f(&mut self.segments[index]);
        self.recompute();
        Some(result)
    }

    /// Rebuild spans and total duration from the segment list.
    pub fn recompute(&mut self) {
        self.spans.clear();
        let mut cursor = 0.0;
        for (index, segment) in self.segments.iter().enumerate() {
            let global_end = cursor + segment.trimmed_duration();
            self.spans.push(SegmentSpan {
                id: segment.id(),
                index,
                global_start: cursor,
                global_end,
            });
            cursor = global_end;
        }
        self.total = cursor;
    }

    /// Map a global time to `(segment, local time)`.
    ///
    /// Returns `None` for times outside `[0, total_duration)`, including
    /// `total_duration` itself; callers treat that as end of sequence. A
    /// time exactly on a boundary resolves to the later segment.
    pub fn resolve(&self, global_time: f64) -> Option<Resolved> {
        let span = self.spans.iter().find(|span| span.contains(global_time))?;
        let segment = &self.segments[span.index];
        Some(Resolved {
            index: span.index,
            segment_id: span.id,
            local_time: segment.trim_start() + (global_time - span.global_start),
            global_start: span.global_start,
        })
    }

    pub fn index_of(&self, id: SegmentId) -> Option<usize> {
        self.segments.iter().position(|s| s.id() == id)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id() == id)
    }

    pub fn span_of(&self, id: SegmentId) -> Option<&SegmentSpan> {
        self.spans.iter().find(|s| s.id == id)
    }

    /// Global position where the segment's active range begins.
    pub fn global_start_of(&self, id: SegmentId) -> Option<f64> {
        self.span_of(id).map(|s| s.global_start)
    }

    /// Translate a source-local time of `id` back to global time, clamped
    /// into the segment's global range.
    pub fn to_global(&self, id: SegmentId, local_time: f64) -> Option<f64> {
        let span = self.span_of(id)?;
        let segment = &self.segments[span.index];
        let global = span.global_start + (local_time - segment.trim_start());
        Some(global.clamp(span.global_start, span.global_end))
    }

    /// Span following `id` in timeline order.
    pub fn next_after(&self, id: SegmentId) -> Option<&SegmentSpan> {
        let index = self.index_of(id)?;
        self.spans.get(index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trimmed(id: u64, source: f64, start: f64, end: f64) -> Segment {
        let mut seg = Segment::new(SegmentId(id), format!("clip-{id}"), source);
        seg.set_trim(start, end);
        seg
    }

    fn two_segments() -> TimelineEngine {
        // 10s active from a 20s source starting at 2s, then 5s from 1s.
        TimelineEngine::with_segments(vec![trimmed(1, 20.0, 2.0, 12.0), trimmed(2, 8.0, 1.0, 6.0)])
    }

    #[test]
    fn test_empty_timeline() {
        let engine = TimelineEngine::new();
        assert_eq!(engine.total_duration(), 0.0);
        assert!(engine.resolve(0.0).is_none());
        assert!(engine.spans().is_empty());
    }

    #[test]
    fn test_total_duration_is_sum_of_active_ranges() {
        let engine = two_segments();
        assert!((engine.total_duration() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_inside_first_segment() {
        let engine = two_segments();
        let r = engine.resolve(4.0).unwrap();
        assert_eq!(r.index, 0);
        assert_eq!(r.segment_id, SegmentId(1));
        assert!((r.local_time - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_boundary_resolves_to_later_segment() {
        let engine = two_segments();
        let r = engine.resolve(10.0).unwrap();
        assert_eq!(r.index, 1);
        assert!((r.local_time - 1.0).abs() < 1e-9);
        assert!((r.global_start - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_out_of_range_is_none() {
        let engine = two_segments();
        assert!(engine.resolve(15.0).is_none());
        assert!(engine.resolve(-0.01).is_none());
        assert!(engine.resolve(99.0).is_none());
        assert!(engine.resolve(f64::NAN).is_none());
    }

    #[test]
    fn test_spans_have_no_gaps() {
        let engine = two_segments();
        let spans = engine.spans();
        assert_eq!(spans[0].global_start, 0.0);
        assert_eq!(spans[0].global_end, spans[1].global_start);
        assert_eq!(spans[1].global_end, engine.total_duration());
    }

    #[test]
    fn test_reverse_mapping() {
        let engine = two_segments();
        assert_eq!(engine.global_start_of(SegmentId(2)), Some(10.0));
        assert!((engine.to_global(SegmentId(2), 3.5).unwrap() - 12.5).abs() < 1e-9);
        // Local times outside the active range clamp into the span.
        assert_eq!(engine.to_global(SegmentId(2), 0.0), Some(10.0));
        assert_eq!(engine.global_start_of(SegmentId(9)), None);
    }

    #[test]
    fn test_update_recomputes() {
        let mut engine = two_segments();
        engine.update(SegmentId(1), |seg| seg.set_trim(2.0, 4.0));
        assert!((engine.total_duration() - 7.0).abs() < 1e-9);
        assert_eq!(engine.global_start_of(SegmentId(2)), Some(2.0));
    }

    #[test]
    fn test_take_removes_and_recomputes() {
        let mut engine = two_segments();
        let (index, seg, span) = engine.take(SegmentId(1)).unwrap();
        assert_eq!(index, 0);
        assert_eq!(seg.id(), SegmentId(1));
        assert_eq!(span.global_end, 10.0);
        assert_eq!(engine.global_start_of(SegmentId(2)), Some(0.0));
        assert!((engine.total_duration() - 5.0).abs() < 1e-9);
        assert!(engine.take(SegmentId(1)).is_none());
    }

    #[test]
    fn test_next_after() {
        let engine = two_segments();
        assert_eq!(engine.next_after(SegmentId(1)).map(|s| s.id), Some(SegmentId(2)));
        assert!(engine.next_after(SegmentId(2)).is_none());
    }
}
