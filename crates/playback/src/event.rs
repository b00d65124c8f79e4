//! Inputs and outputs of the playback state machine.
//!
//! Every input is a [`PlaybackEvent`]. Events are consumed one at a time in
//! the order they were submitted; nothing mutates engine state concurrently.

use std::collections::VecDeque;

use cutline_model::{LayerId, SegmentId};
use serde::{Deserialize, Serialize};

use crate::backend::RequestId;
use crate::binding::BindingError;

/// Discrete input to the synchronizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    AddSegment {
        name: String,
        source_duration: f64,
    },
    RemoveSegment {
        id: SegmentId,
    },
    /// `None` clears the selection.
    SelectSegment {
        id: Option<SegmentId>,
    },
    SetTrimStart {
        id: SegmentId,
        seconds: f64,
    },
    SetTrimEnd {
        id: SegmentId,
        seconds: f64,
    },
    Play,
    Pause,
    Seek {
        seconds: f64,
    },
    /// Relative seek (skip forward/backward buttons).
    Skip {
        seconds: f64,
    },
    /// Local position reported by the bound video resource.
    Progress {
        request: RequestId,
        local_time: f64,
    },
    /// Completion of an earlier load request.
    LoadCompleted {
        request: RequestId,
        outcome: LoadOutcome,
    },
    /// The bound resource played to the end of its source.
    Ended {
        request: RequestId,
    },
    AddAudioLayer {
        name: String,
        source_duration: f64,
    },
    RemoveAudioLayer {
        id: LayerId,
    },
    SetLayerGain {
        id: LayerId,
        gain: f64,
    },
    SetLayerOffset {
        id: LayerId,
        offset: f64,
    },
}

/// Result of a load as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    Ready,
    Failed { reason: String },
}

/// Things the presentation layer may want to react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// The binding moved to a different segment.
    SegmentChanged {
        from: Option<SegmentId>,
        to: SegmentId,
    },
    /// The bound resource drifted past the threshold and was repositioned.
    DriftCorrected {
        segment: SegmentId,
        expected: f64,
        reported: f64,
    },
    BindingFailed {
        error: BindingError,
    },
    /// Playback ran off the last segment; the playhead was reset to 0.
    EndOfSequence,
}

/// FIFO of pending events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<PlaybackEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: PlaybackEvent) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<PlaybackEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = EventQueue::new();
        queue.push(PlaybackEvent::Play);
        queue.push(PlaybackEvent::Seek { seconds: 3.0 });
        queue.push(PlaybackEvent::Pause);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(PlaybackEvent::Play));
        assert_eq!(queue.pop(), Some(PlaybackEvent::Seek { seconds: 3.0 }));
        assert_eq!(queue.pop(), Some(PlaybackEvent::Pause));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_wire_format() {
        let event: PlaybackEvent = serde_json::from_str(
            r#"{ "type": "load_completed", "request": 4, "outcome": { "status": "failed", "reason": "404" } }"#,
        )
        .unwrap();
        assert_eq!(
            event,
            PlaybackEvent::LoadCompleted {
                request: RequestId(4),
                outcome: LoadOutcome::Failed {
                    reason: "404".to_string()
                }
            }
        );

        let json = serde_json::to_value(PlaybackEvent::AddSegment {
            name: "a.mp4".to_string(),
            source_duration: 12.0,
        })
        .unwrap();
        assert_eq!(json["type"], "add_segment");
        assert_eq!(json["source_duration"], 12.0);
    }

    #[test]
    fn test_select_null_clears() {
        let event: PlaybackEvent =
            serde_json::from_str(r#"{ "type": "select_segment", "id": null }"#).unwrap();
        assert_eq!(event, PlaybackEvent::SelectSegment { id: None });
    }
}
