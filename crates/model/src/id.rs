//! Identifier newtypes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a segment for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u64);

/// Stable identity of an audio layer for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seg-{}", self.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

/// Monotonic id source. Ids are never reused, so a removed entity can
/// never be confused with a later one.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_segment(&mut self) -> SegmentId {
        SegmentId(self.bump())
    }

    pub fn next_layer(&mut self) -> LayerId {
        LayerId(self.bump())
    }

    fn bump(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_across_kinds() {
        let mut ids = IdAllocator::new();
        let a = ids.next_segment();
        let b = ids.next_layer();
        let c = ids.next_segment();
        assert_ne!(a, c);
        assert_ne!(a.0, b.0);
        assert_ne!(b.0, c.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(SegmentId(3).to_string(), "seg-3");
        assert_eq!(LayerId(7).to_string(), "layer-7");
    }

    #[test]
    fn test_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&SegmentId(12)).unwrap(), "12");
        let parsed: LayerId = serde_json::from_str("4").unwrap();
        assert_eq!(parsed, LayerId(4));
    }
}
