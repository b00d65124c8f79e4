//! Clock and timing utilities for playback synchronization.
//!
//! All Cutline positions are `f64` seconds. This module provides:
//! - Drift measurement between the virtual playhead and a bound resource
//! - Timecode formatting for rulers and labels
//! - Wall-clock stamps for reports

/// Drift measurement between the expected and reported position of a
/// playback resource, in seconds of source-local time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftMeasurement {
    /// Position the timeline mapping says the resource should be at.
    pub expected_secs: f64,
    /// Position the resource reported.
    pub reported_secs: f64,
}

impl DriftMeasurement {
    pub fn new(expected_secs: f64, reported_secs: f64) -> Self {
        Self {
            expected_secs,
            reported_secs,
        }
    }

    /// Drift in seconds (positive = resource is ahead).
    pub fn drift_secs(&self) -> f64 {
        self.reported_secs - self.expected_secs
    }

    /// Whether drift strictly exceeds the threshold.
    pub fn exceeds(&self, threshold_secs: f64) -> bool {
        self.drift_secs().abs() > threshold_secs
    }
}

/// Format seconds as `m:ss`, truncating fractional seconds.
///
/// Negative and non-finite inputs render as `0:00`.
pub fn format_timecode(secs: f64) -> String {
    if !secs.is_finite() || secs <= 0.0 {
        return "0:00".to_string();
    }
    let whole = secs.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

/// Current wall-clock time as an RFC 3339 string.
pub fn wall_clock_now() -> String {
    chrono::Utc::now().to_rfc3339()
}
