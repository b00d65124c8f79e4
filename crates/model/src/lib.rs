//! Cutline Timeline Model
//!
//! Defines the core data contracts for a Cutline timeline:
//! - **Ids:** Stable identifiers handed back to the presentation layer
//! - **Segments:** Trimmed source clips placed back to back on the timeline
//! - **Audio layers:** Independently timed overlays with their own gain
//!
//! All times are `f64` seconds. Global positions (`SegmentSpan`) are
//! derived data and never stored on a `Segment`.

pub mod audio;
pub mod id;
pub mod segment;

pub use audio::*;
pub use id::*;
pub use segment::*;
