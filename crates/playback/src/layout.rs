//! Ruler and track-view geometry.
//!
//! Maps timeline seconds to horizontal pixels for a presentation layer that
//! draws the whole sequence in a fixed-width viewport.

use cutline_common::clock::format_timecode;
use cutline_common::config::RulerConfig;
use cutline_model::{SegmentId, SegmentSpan};
use serde::Serialize;

/// Upper bound on ruler ticks. Finer intervals are widened to fit.
pub const MAX_RULER_TICKS: usize = 10_000;

/// One labelled tick on the ruler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RulerTick {
    pub time: f64,
    pub x: f64,
    pub label: String,
}

/// Horizontal extent of a segment in the track view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentRect {
    pub id: SegmentId,
    pub x: f64,
    pub width: f64,
}

/// Pixel scale for a timeline of a given duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineLayout {
    total_duration: f64,
    pixels_per_second: f64,
}

impl TimelineLayout {
    /// Fit `total_duration` into `viewport_width` pixels, or use the
    /// fallback scale when there is nothing to fit.
    pub fn new(total_duration: f64, viewport_width: f64, fallback_pixels_per_second: f64) -> Self {
        let pixels_per_second = if total_duration > 0.0 && viewport_width > 0.0 {
            viewport_width / total_duration
        } else {
            fallback_pixels_per_second
        };
        Self {
            total_duration: total_duration.max(0.0),
            pixels_per_second,
        }
    }

    pub fn from_config(total_duration: f64, config: &RulerConfig) -> Self {
        Self::new(
            total_duration,
            config.viewport_width_px,
            config.fallback_pixels_per_second,
        )
    }

    pub fn pixels_per_second(&self) -> f64 {
        self.pixels_per_second
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn x_for_time(&self, time: f64) -> f64 {
        time * self.pixels_per_second
    }

    /// Inverse of [`x_for_time`](Self::x_for_time), clamped to the
    /// timeline. Used for click-to-seek.
    pub fn time_for_x(&self, x: f64) -> f64 {
        if self.pixels_per_second <= 0.0 {
            return 0.0;
        }
        (x / self.pixels_per_second).clamp(0.0, self.total_duration)
    }

    /// Ticks every `interval` seconds from 0, one past the last full
    /// interval so the end of the sequence is always labelled. At most
    /// [`MAX_RULER_TICKS`] + 1 ticks are produced.
    pub fn ruler_ticks(&self, interval: f64) -> Vec<RulerTick> {
        if !(interval.is_finite() && interval > 0.0) {
            return Vec::new();
        }
        let interval = interval.max(self.total_duration / MAX_RULER_TICKS as f64);
        let count = (self.total_duration / interval).ceil() as usize + 1;
        (0..count)
            .map(|i| {
                let time = i as f64 * interval;
                RulerTick {
                    time,
                    x: self.x_for_time(time),
                    label: format_timecode(time),
                }
            })
            .collect()
    }

    pub fn segment_rects(&self, spans: &[SegmentSpan]) -> Vec<SegmentRect> {
        spans
            .iter()
            .map(|span| SegmentRect {
                id: span.id,
                x: self.x_for_time(span.global_start),
                width: span.duration() * self.pixels_per_second,
            })
            .collect()
    }
}
