use cutline_model::{Segment, SegmentId};
use cutline_playback::{TimelineEngine, TrimController};
use proptest::prelude::*;

const EPS: f64 = 1e-9;

/// `(source_duration, trim fraction a, trim fraction b)` per segment.
fn segment_params() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec((0.5f64..60.0, 0.0f64..1.0, 0.0f64..1.0), 1..8)
}

fn build(params: &[(f64, f64, f64)]) -> TimelineEngine {
    let trim = TrimController::default();
    let mut engine = TimelineEngine::new();
    for (i, (duration, a, b)) in params.iter().enumerate() {
        let id = SegmentId(i as u64 + 1);
        engine.push(Segment::new(id, format!("clip-{i}"), *duration));
        trim.set_trim_end(&mut engine, id, duration * a.max(*b));
        trim.set_trim_start(&mut engine, id, duration * a.min(*b));
    }
    engine
}

proptest! {
    #[test]
    fn total_duration_is_sum_of_trimmed_durations(params in segment_params()) {
        let engine = build(&params);
        let sum: f64 = engine.segments().iter().map(Segment::trimmed_duration).sum();
        prop_assert!((engine.total_duration() - sum).abs() < 1e-6);
    }

    #[test]
    fn every_segment_keeps_minimum_length(params in segment_params()) {
        let engine = build(&params);
        for segment in engine.segments() {
            prop_assert!(segment.trim_start() >= 0.0);
            prop_assert!(segment.trim_end() <= segment.source_duration() + EPS);
            prop_assert!(segment.trimmed_duration() >= 0.1 - EPS);
        }
    }

    #[test]
    fn resolve_hits_exactly_one_segment(params in segment_params(), frac in 0.0f64..1.0) {
        let engine = build(&params);
        let t = engine.total_duration() * frac;
        prop_assume!(t < engine.total_duration());

        let resolved = engine.resolve(t).expect("time inside the timeline resolves");
        let containing = engine.spans().iter().filter(|s| s.contains(t)).count();
        prop_assert_eq!(containing, 1);

        let span = engine.span_of(resolved.segment_id).unwrap();
        prop_assert!(span.contains(t));

        let segment = engine.segment(resolved.segment_id).unwrap();
        prop_assert!(resolved.local_time >= segment.trim_start() - EPS);
        prop_assert!(resolved.local_time < segment.trim_end() + EPS);

        // Resolution has no side effects.
        prop_assert_eq!(engine.resolve(t), Some(resolved));
    }

    #[test]
    fn resolve_outside_range_is_none(params in segment_params(), past in 0.0f64..100.0) {
        let engine = build(&params);
        prop_assert!(engine.resolve(engine.total_duration() + past).is_none());
        prop_assert!(engine.resolve(-past - EPS).is_none());
    }

    #[test]
    fn to_global_inverts_resolve(params in segment_params(), frac in 0.0f64..1.0) {
        let engine = build(&params);
        let t = engine.total_duration() * frac;
        prop_assume!(t < engine.total_duration());

        let resolved = engine.resolve(t).unwrap();
        let back = engine.to_global(resolved.segment_id, resolved.local_time).unwrap();
        prop_assert!((back - t).abs() < 1e-6);
    }

    #[test]
    fn trim_start_past_end_clamps_to_min_length(
        duration in 1.0f64..60.0,
        end_frac in 0.5f64..1.0,
        overshoot in 0.0f64..10.0,
    ) {
        let trim = TrimController::default();
        let id = SegmentId(1);
        let mut engine = TimelineEngine::with_segments(vec![Segment::new(id, "clip", duration)]);
        let end = trim.set_trim_end(&mut engine, id, duration * end_frac).unwrap();

        let applied = trim.set_trim_start(&mut engine, id, end + overshoot).unwrap();
        prop_assert!((applied - (end - 0.1)).abs() < EPS);
    }

    #[test]
    fn trim_end_before_start_clamps_to_min_length(
        duration in 1.0f64..60.0,
        start_frac in 0.0f64..0.5,
        undershoot in 0.0f64..10.0,
    ) {
        let trim = TrimController::default();
        let id = SegmentId(1);
        let mut engine = TimelineEngine::with_segments(vec![Segment::new(id, "clip", duration)]);
        let start = trim.set_trim_start(&mut engine, id, duration * start_frac).unwrap();

        let applied = trim.set_trim_end(&mut engine, id, start - undershoot).unwrap();
        prop_assert!((applied - (start + 0.1)).abs() < EPS);
    }
}
