//! The single active video binding.

use cutline_model::SegmentId;
use serde::Serialize;

use crate::backend::{LoadRequest, RequestId};

/// Lifecycle of the bound resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingStatus {
    /// Load requested, completion not yet received.
    Loading,
    /// Loaded and positioned.
    Ready,
    /// The backend reported a load failure; no automatic retry.
    Failed,
}

/// The one video resource the synchronizer is driving.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundResource {
    pub request: LoadRequest,
    pub status: BindingStatus,
}

impl BoundResource {
    pub(crate) fn loading(request: LoadRequest) -> Self {
        Self {
            request,
            status: BindingStatus::Loading,
        }
    }

    pub fn segment_id(&self) -> SegmentId {
        self.request.segment_id
    }

    pub fn request_id(&self) -> RequestId {
        self.request.id
    }

    pub fn is_ready(&self) -> bool {
        self.status == BindingStatus::Ready
    }

    /// Whether this binding is a ready resource for `segment`.
    pub fn is_ready_for(&self, segment: SegmentId) -> bool {
        self.is_ready() && self.segment_id() == segment
    }
}

/// A load the backend could not complete.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("failed to bind {segment} ({request}): {reason}")]
pub struct BindingError {
    pub segment: SegmentId,
    pub request: RequestId,
    pub reason: String,
}
