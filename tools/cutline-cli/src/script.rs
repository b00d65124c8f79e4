//! Playback scripts.
//!
//! A script is a JSON document with an ordered list of steps:
//!
//! ```json
//! {
//!   "name": "two clips",
//!   "steps": [
//!     { "event": { "type": "add_segment", "name": "a.mp4", "source_duration": 10.0 } },
//!     { "event": { "type": "play" } },
//!     { "advance": 2.5 },
//!     { "snapshot": null }
//!   ]
//! }
//! ```

use std::path::Path;

use cutline_common::{CutlineError, CutlineResult};
use cutline_playback::PlaybackEvent;
use serde::Deserialize;

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Submit an event to the synchronizer.
    Event(PlaybackEvent),
    /// Let time pass, ticking the simulated backend.
    Advance(f64),
    /// Make the next load completion a failure with this reason.
    FailNextLoad(String),
    /// Skip forward by the configured skip length.
    SkipForward,
    /// Skip backward by the configured skip length.
    SkipBackward,
    /// Record a snapshot of the timeline.
    Snapshot,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn load(path: &Path) -> CutlineResult<Self> {
        if !path.exists() {
            return Err(CutlineError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            CutlineError::Json(e) => CutlineError::script(format!("{}: {e}", path.display())),
            other => other,
        })
    }

    pub fn parse(json: &str) -> CutlineResult<Self> {
        let script: Script = serde_json::from_str(json)?;
        script.check()?;
        Ok(script)
    }

    fn check(&self) -> CutlineResult<()> {
        for (index, step) in self.steps.iter().enumerate() {
            if let Step::Advance(secs) = step {
                if !(secs.is_finite() && *secs >= 0.0) {
                    return Err(CutlineError::script(format!(
                        "step {index}: advance must be a non-negative number of seconds, got {secs}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn event_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| !matches!(s, Step::Advance(_) | Step::Snapshot))
            .count()
    }

    /// Simulated seconds the script lets pass in total.
    pub fn total_advance(&self) -> f64 {
        self.steps
            .iter()
            .map(|s| match s {
                Step::Advance(secs) => *secs,
                _ => 0.0,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_step_kinds() {
        let script = Script::parse(
            r#"{
                "name": "demo",
                "steps": [
                    { "event": { "type": "add_segment", "name": "a.mp4", "source_duration": 10.0 } },
                    { "fail_next_load": "codec" },
                    { "event": { "type": "play" } },
                    { "advance": 1.5 },
                    { "skip_forward": null },
                    "skip_backward",
                    { "snapshot": null }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(script.name.as_deref(), Some("demo"));
        assert_eq!(script.steps.len(), 7);
        assert_eq!(script.steps[1], Step::FailNextLoad("codec".to_string()));
        assert_eq!(script.steps[6], Step::Snapshot);
        assert_eq!(script.event_count(), 5);
        assert!((script.total_advance() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_negative_advance_rejected() {
        let err = Script::parse(r#"{ "steps": [ { "advance": -1.0 } ] }"#).unwrap_err();
        assert!(matches!(err, CutlineError::Script { .. }));
    }

    #[test]
    fn test_unknown_event_rejected() {
        let err = Script::parse(r#"{ "steps": [ { "event": { "type": "explode" } } ] }"#)
            .unwrap_err();
        assert!(matches!(err, CutlineError::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Script::load(Path::new("/nonexistent/cutline-script.json")).unwrap_err();
        assert!(matches!(err, CutlineError::FileNotFound { .. }));
    }
}
