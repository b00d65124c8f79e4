//! Cutline Playback Core
//!
//! Drives a single virtual timeline over an ordered list of trimmed
//! segments:
//! - **Engine:** Global duration and global↔local time mapping
//! - **Trim:** Clamped mutation of segment trim bounds and removal
//! - **Synchronizer:** State machine owning the playhead and the one bound
//!   video resource, with drift correction and segment transitions
//! - **Audio:** Overlay layers scheduled against the same global clock
//!
//! This crate is pure computation with no I/O and no threads. The actual
//! playback primitives sit behind the [`MediaBackend`] and
//! [`AudioBackend`] traits and report back through [`PlaybackEvent`]s.

pub mod audio;
pub mod backend;
pub mod binding;
pub mod engine;
pub mod event;
pub mod layout;
pub mod snapshot;
pub mod synchronizer;
pub mod trim;

pub use audio::AudioOverlayScheduler;
pub use backend::{AudioBackend, LoadRequest, MediaBackend, RequestId, SimulatedBackend};
pub use binding::{BindingError, BindingStatus, BoundResource};
pub use engine::{Resolved, TimelineEngine};
pub use event::{EventQueue, LoadOutcome, Notification, PlaybackEvent};
pub use layout::TimelineLayout;
pub use snapshot::TimelineSnapshot;
pub use synchronizer::{PlaybackState, PlaybackSynchronizer};
pub use trim::TrimController;
