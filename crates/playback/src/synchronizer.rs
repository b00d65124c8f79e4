//! Playback state machine.
//!
//! [`PlaybackSynchronizer`] is the single owner of the segment list, the
//! global playhead and the one bound video resource. Every mutation goes
//! through it; [`TimelineEngine`] and [`TrimController`] are helpers it
//! calls, never independent owners.
//!
//! State transitions:
//!
//! ```text
//! Idle ──add──▶ Stopped ──play──▶ Playing ──pause / end──▶ Stopped
//!                  ▲                 │
//!                  └── SeekPending ◀─┘  (seek, rebind at a boundary)
//! ```
//!
//! Binding a resource is the expensive step. It happens only when the
//! resolved segment changes (boundary crossing, seek, play from a different
//! segment, or an edit that moves the playhead) and never per tick.

use cutline_common::clock::DriftMeasurement;
use cutline_common::config::PlaybackConfig;
use cutline_model::{AudioLayer, IdAllocator, LayerId, Segment, SegmentId, SegmentSpan};
use serde::Serialize;

use crate::audio::AudioOverlayScheduler;
use crate::backend::{AudioBackend, LoadRequest, MediaBackend, RequestId};
use crate::binding::{BindingError, BindingStatus, BoundResource};
use crate::engine::{Resolved, TimelineEngine};
use crate::event::{EventQueue, LoadOutcome, Notification, PlaybackEvent};
use crate::snapshot::TimelineSnapshot;
use crate::trim::TrimController;

/// Local-time differences below this are treated as no movement.
const TIME_EPSILON: f64 = 1e-9;

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No segments on the timeline.
    Idle,
    Stopped,
    Playing,
    /// A load is in flight; `resume` is the play/pause intent to restore
    /// once it completes.
    SeekPending { resume: bool },
}

impl PlaybackState {
    /// Playing, or about to resume playing once the pending load lands.
    pub fn is_playing(&self) -> bool {
        matches!(
            self,
            PlaybackState::Playing | PlaybackState::SeekPending { resume: true }
        )
    }
}

/// Owns the timeline and keeps the bound resource in step with it.
pub struct PlaybackSynchronizer<B> {
    backend: B,
    engine: TimelineEngine,
    trim: TrimController,
    audio: AudioOverlayScheduler,
    config: PlaybackConfig,
    ids: IdAllocator,
    state: PlaybackState,
    current_time: f64,
    selected: Option<SegmentId>,
    binding: Option<BoundResource>,
    /// Source-local position the bound resource was last sent to or
    /// reported past. A report that falls behind it is drift.
    resource_floor: Option<f64>,
    last_request: u64,
    queue: EventQueue,
    notifications: Vec<Notification>,
}

impl<B: MediaBackend + AudioBackend> PlaybackSynchronizer<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, PlaybackConfig::default())
    }

    pub fn with_config(backend: B, config: PlaybackConfig) -> Self {
        Self {
            backend,
            engine: TimelineEngine::new(),
            trim: TrimController::new(config.min_segment_secs),
            audio: AudioOverlayScheduler::new(),
            config,
            ids: IdAllocator::new(),
            state: PlaybackState::Idle,
            current_time: 0.0,
            selected: None,
            binding: None,
            resource_floor: None,
            last_request: 0,
            queue: EventQueue::new(),
            notifications: Vec::new(),
        }
    }

    // ── Read surface ────────────────────────────────────────────────

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn total_duration(&self) -> f64 {
        self.engine.total_duration()
    }

    pub fn selected(&self) -> Option<SegmentId> {
        self.selected
    }

    /// The one bound video resource, if any.
    pub fn binding(&self) -> Option<&BoundResource> {
        self.binding.as_ref()
    }

    pub fn spans(&self) -> &[SegmentSpan] {
        self.engine.spans()
    }

    pub fn engine(&self) -> &TimelineEngine {
        &self.engine
    }

    pub fn audio(&self) -> &AudioOverlayScheduler {
        &self.audio
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Segment and source position the preview should be showing.
    pub fn current_frame_source(&self) -> Option<Resolved> {
        self.engine.resolve(self.current_time)
    }

    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot::capture(
            self.state,
            self.current_time,
            self.selected,
            self.binding.as_ref(),
            &self.engine,
            &self.audio,
        )
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // ── Event queue ─────────────────────────────────────────────────

    /// Enqueue an event for [`run_pending`](Self::run_pending).
    pub fn submit(&mut self, event: PlaybackEvent) {
        self.queue.push(event);
    }

    /// Process queued events in submission order. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Some(event) = self.queue.pop() {
            self.dispatch(event);
            processed += 1;
        }
        processed
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Handle one event immediately.
    pub fn dispatch(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::AddSegment {
                name,
                source_duration,
            } => {
                self.add_segment(name, source_duration);
            }
            PlaybackEvent::RemoveSegment { id } => {
                self.remove_segment(id);
            }
            PlaybackEvent::SelectSegment { id: Some(id) } => {
                self.select_segment(id);
            }
            PlaybackEvent::SelectSegment { id: None } => self.clear_selection(),
            PlaybackEvent::SetTrimStart { id, seconds } => {
                self.set_trim_start(id, seconds);
            }
            PlaybackEvent::SetTrimEnd { id, seconds } => {
                self.set_trim_end(id, seconds);
            }
            PlaybackEvent::Play => self.play(),
            PlaybackEvent::Pause => self.pause(),
            PlaybackEvent::Seek { seconds } => self.seek(seconds),
            PlaybackEvent::Skip { seconds } => self.skip(seconds),
            PlaybackEvent::Progress {
                request,
                local_time,
            } => self.report_progress(request, local_time),
            PlaybackEvent::LoadCompleted { request, outcome } => {
                self.complete_load(request, outcome)
            }
            PlaybackEvent::Ended { request } => self.report_ended(request),
            PlaybackEvent::AddAudioLayer {
                name,
                source_duration,
            } => {
                self.add_audio_layer(name, source_duration);
            }
            PlaybackEvent::RemoveAudioLayer { id } => {
                self.remove_audio_layer(id);
            }
            PlaybackEvent::SetLayerGain { id, gain } => {
                self.set_layer_gain(id, gain);
            }
            PlaybackEvent::SetLayerOffset { id, offset } => {
                self.set_layer_offset(id, offset);
            }
        }
    }

    // ── Segment editing ─────────────────────────────────────────────

    /// Append a segment covering its whole source. The new segment
    /// becomes the selection.
    pub fn add_segment(&mut self, name: impl Into<String>, source_duration: f64) -> SegmentId {
        let name = name.into();
        let duration = if source_duration.is_finite() && source_duration > 0.0 {
            source_duration
        } else {
            let floor = self.trim.min_length();
            tracing::warn!(%name, source_duration, floor, "invalid source duration, clamping");
            floor
        };

        let id = self.ids.next_segment();
        self.engine.push(Segment::new(id, name, duration));
        self.selected = Some(id);
        tracing::info!(%id, duration, total = self.engine.total_duration(), "segment added");

        if self.state == PlaybackState::Idle {
            self.transition(PlaybackState::Stopped);
        }
        id
    }

    /// Delete a segment. Clears the selection and the binding if either
    /// referred to it. Returns `false` for unknown ids.
    pub fn remove_segment(&mut self, id: SegmentId) -> bool {
        let before = self.engine.resolve(self.current_time);
        let Some(removed) = self.trim.remove_segment(&mut self.engine, id) else {
            tracing::debug!(%id, "remove ignored, unknown segment");
            return false;
        };

        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.binding.as_ref().is_some_and(|b| b.segment_id() == id) {
            self.release_binding();
        }
        tracing::info!(
            %id,
            index = removed.index,
            total = self.engine.total_duration(),
            "segment removed"
        );

        self.resync(before);
        true
    }

    /// Select a segment. Unknown ids leave the selection unchanged.
    pub fn select_segment(&mut self, id: SegmentId) {
        if self.engine.segment(id).is_some() {
            self.selected = Some(id);
        } else {
            tracing::debug!(%id, "select ignored, unknown segment");
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Returns the applied (clamped) value, or `None` for unknown ids.
    pub fn set_trim_start(&mut self, id: SegmentId, seconds: f64) -> Option<f64> {
        let before = self.engine.resolve(self.current_time);
        let applied = self.trim.set_trim_start(&mut self.engine, id, seconds)?;
        tracing::debug!(%id, proposed = seconds, applied, "trim start");
        self.resync(before);
        Some(applied)
    }

    /// Returns the applied (clamped) value, or `None` for unknown ids.
    pub fn set_trim_end(&mut self, id: SegmentId, seconds: f64) -> Option<f64> {
        let before = self.engine.resolve(self.current_time);
        let applied = self.trim.set_trim_end(&mut self.engine, id, seconds)?;
        tracing::debug!(%id, proposed = seconds, applied, "trim end");
        self.resync(before);
        Some(applied)
    }

    // ── Transport ───────────────────────────────────────────────────

    pub fn play(&mut self) {
        match self.state {
            PlaybackState::Idle
            | PlaybackState::Playing
            | PlaybackState::SeekPending { resume: true } => return,
            PlaybackState::SeekPending { resume: false } => {
                self.transition(PlaybackState::SeekPending { resume: true });
            }
            PlaybackState::Stopped => {
                let Some(target) = self.engine.resolve(self.current_time) else {
                    tracing::debug!(current_time = self.current_time, "play ignored at end of sequence");
                    return;
                };
                if self.is_bound_ready(target.segment_id) {
                    self.reposition(target.local_time);
                    self.backend.play();
                    self.transition(PlaybackState::Playing);
                } else {
                    self.rebind(target, true);
                }
            }
        }
        self.sync_audio(false);
    }

    pub fn pause(&mut self) {
        match self.state {
            PlaybackState::Playing => {
                self.backend.pause();
                self.transition(PlaybackState::Stopped);
            }
            PlaybackState::SeekPending { resume: true } => {
                self.transition(PlaybackState::SeekPending { resume: false });
            }
            _ => return,
        }
        self.sync_audio(false);
    }

    /// Jump to a global time, clamped to `[0, total_duration]`. Supersedes
    /// any pending seek or rebind.
    pub fn seek(&mut self, seconds: f64) {
        if self.engine.is_empty() {
            tracing::debug!(seconds, "seek ignored on empty timeline");
            return;
        }
        if seconds.is_nan() {
            return;
        }

        let resume = self.state.is_playing();
        self.current_time = seconds.clamp(0.0, self.engine.total_duration());
        tracing::debug!(requested = seconds, applied = self.current_time, resume, "seek");

        match self.engine.resolve(self.current_time) {
            None => {
                self.cancel_pending_load();
                self.halt();
            }
            Some(target) if self.is_bound_ready(target.segment_id) => {
                self.reposition(target.local_time);
                self.settle(resume);
            }
            Some(target) => self.rebind(target, resume),
        }
        self.sync_audio(true);
    }

    /// Relative seek (skip forward/backward).
    pub fn skip(&mut self, delta: f64) {
        if delta.is_finite() {
            self.seek(self.current_time + delta);
        }
    }

    // ── Resource feedback ───────────────────────────────────────────

    /// Progress tick from the bound resource.
    ///
    /// Crossing the segment's `trim_end` advances to the next segment.
    /// A report that falls behind the last commanded or acknowledged source
    /// position by more than the drift threshold is drift and the resource
    /// is sent back there. Anything else is progress and the playhead
    /// follows the resource.
    pub fn report_progress(&mut self, request: RequestId, local_time: f64) {
        if self.state != PlaybackState::Playing || local_time.is_nan() {
            return;
        }
        let Some(bound) = self
            .binding
            .as_ref()
            .filter(|b| b.request_id() == request && b.is_ready())
            .map(BoundResource::segment_id)
        else {
            tracing::debug!(%request, "discarding progress from stale resource");
            return;
        };
        let Some((trim_start, trim_end)) = self
            .engine
            .segment(bound)
            .map(|s| (s.trim_start(), s.trim_end()))
        else {
            return;
        };

        if local_time >= trim_end {
            self.advance_past(bound);
            return;
        }

        let Some(expected) = self.engine.resolve(self.current_time) else {
            self.halt();
            self.sync_audio(false);
            return;
        };
        if expected.segment_id != bound {
            self.rebind(expected, true);
            self.sync_audio(true);
            return;
        }

        if let Some(floor) = self.resource_floor.filter(|floor| local_time < *floor) {
            let drift = DriftMeasurement::new(floor, local_time);
            if drift.exceeds(self.config.drift_threshold_secs) {
                tracing::info!(
                    segment = %bound,
                    expected = floor,
                    reported = local_time,
                    drift = drift.drift_secs(),
                    "drift correction"
                );
                self.backend.seek_to(floor);
                self.notifications.push(Notification::DriftCorrected {
                    segment: bound,
                    expected: floor,
                    reported: local_time,
                });
                return;
            }
        }
        self.resource_floor = Some(self.resource_floor.map_or(local_time, |f| f.max(local_time)));

        if let Some(global) = self.engine.to_global(bound, local_time.max(trim_start)) {
            if global > self.current_time {
                self.current_time = global;
            }
        }
        self.sync_audio(false);
    }

    /// The bound resource reached the end of its source without a progress
    /// report at or past `trim_end`.
    pub fn report_ended(&mut self, request: RequestId) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(bound) = self
            .binding
            .as_ref()
            .filter(|b| b.request_id() == request && b.is_ready())
            .map(BoundResource::segment_id)
        else {
            tracing::debug!(%request, "discarding end from stale resource");
            return;
        };
        tracing::debug!(%request, segment = %bound, "resource ended");
        self.advance_past(bound);
    }

    /// Completion of a load request. Completions that do not answer the
    /// current binding's request are stale and dropped.
    pub fn complete_load(&mut self, request: RequestId, outcome: LoadOutcome) {
        let Some(binding) = self
            .binding
            .as_mut()
            .filter(|b| b.request_id() == request && b.status == BindingStatus::Loading)
        else {
            tracing::debug!(%request, "discarding stale load completion");
            return;
        };
        let bound = binding.segment_id();

        match outcome {
            LoadOutcome::Failed { reason } => {
                binding.status = BindingStatus::Failed;
                let error = BindingError {
                    segment: bound,
                    request,
                    reason,
                };
                tracing::warn!(%error, "resource binding failed");
                self.notifications
                    .push(Notification::BindingFailed { error });
                if self.state != PlaybackState::Stopped {
                    self.transition(PlaybackState::Stopped);
                }
            }
            LoadOutcome::Ready => match self.engine.resolve(self.current_time) {
                Some(target) if target.segment_id != bound => {
                    tracing::debug!(%request, segment = %bound, "loaded segment no longer under playhead");
                    let resume = self.state.is_playing();
                    self.rebind(target, resume);
                    self.sync_audio(true);
                    return;
                }
                Some(_) => {
                    binding.status = BindingStatus::Ready;
                    tracing::debug!(%request, segment = %bound, "resource ready");
                    if let PlaybackState::SeekPending { resume } = self.state {
                        self.settle(resume);
                    }
                }
                None => {
                    binding.status = BindingStatus::Ready;
                    self.halt();
                }
            },
        }
        self.sync_audio(false);
    }

    // ── Audio overlays ──────────────────────────────────────────────

    pub fn add_audio_layer(&mut self, name: impl Into<String>, source_duration: f64) -> LayerId {
        let name = name.into();
        let duration = if source_duration.is_finite() && source_duration > 0.0 {
            source_duration
        } else {
            tracing::warn!(%name, source_duration, "invalid audio duration, layer will stay silent");
            0.0
        };
        let id = self.ids.next_layer();
        tracing::info!(%id, %name, duration, "audio layer added");
        self.audio.add_layer(AudioLayer::new(
            id,
            name,
            duration,
            self.config.default_layer_gain,
        ));
        self.sync_audio(false);
        id
    }

    pub fn remove_audio_layer(&mut self, id: LayerId) -> bool {
        self.audio.remove_layer(id, &mut self.backend).is_some()
    }

    /// Returns the applied (clamped) gain, or `None` for unknown ids.
    pub fn set_layer_gain(&mut self, id: LayerId, gain: f64) -> Option<f64> {
        self.audio.set_gain(id, gain, &mut self.backend)
    }

    /// Returns the applied (clamped) offset, or `None` for unknown ids.
    pub fn set_layer_offset(&mut self, id: LayerId, offset: f64) -> Option<f64> {
        let applied = self.audio.set_offset(id, offset)?;
        self.sync_audio(true);
        Some(applied)
    }

    // ── Internals ───────────────────────────────────────────────────

    fn transition(&mut self, next: PlaybackState) {
        if self.state != next {
            tracing::info!(from = ?self.state, to = ?next, current_time = self.current_time, "playback state");
            self.state = next;
        }
    }

    fn is_bound_ready(&self, segment: SegmentId) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|b| b.is_ready_for(segment))
    }

    fn reposition(&mut self, local_time: f64) {
        self.backend.seek_to(local_time);
        self.resource_floor = Some(local_time);
    }

    fn release_binding(&mut self) {
        if self.binding.take().is_some() {
            self.backend.pause();
            self.backend.unload();
        }
        self.resource_floor = None;
    }

    /// Drop a load that was issued for a position the playhead has since
    /// left, so its completion is recognised as stale.
    fn cancel_pending_load(&mut self) {
        if let Some(pending) = self
            .binding
            .as_ref()
            .filter(|b| b.status == BindingStatus::Loading)
        {
            tracing::debug!(request = %pending.request_id(), "cancelling superseded load");
            self.release_binding();
        }
    }

    /// Issue a load for `target`, superseding any earlier request.
    fn rebind(&mut self, target: Resolved, resume: bool) {
        let previous = self.binding.as_ref().map(BoundResource::segment_id);
        if self.state == PlaybackState::Playing {
            self.backend.pause();
        }

        self.last_request += 1;
        let request = LoadRequest {
            id: RequestId(self.last_request),
            segment_id: target.segment_id,
            local_time: target.local_time,
        };
        tracing::info!(
            segment = %target.segment_id,
            local_time = target.local_time,
            request = %request.id,
            "binding resource"
        );
        self.backend.load(&request);
        self.resource_floor = Some(request.local_time);
        self.binding = Some(BoundResource::loading(request));
        self.transition(PlaybackState::SeekPending { resume });

        if previous != Some(target.segment_id) {
            self.notifications.push(Notification::SegmentChanged {
                from: previous,
                to: target.segment_id,
            });
        }
    }

    /// Restore play/pause intent on a ready binding.
    fn settle(&mut self, resume: bool) {
        match (resume, self.state) {
            (true, PlaybackState::Playing) | (false, PlaybackState::Stopped) => {}
            (true, _) => {
                self.backend.play();
                self.transition(PlaybackState::Playing);
            }
            (false, PlaybackState::Playing) => {
                self.backend.pause();
                self.transition(PlaybackState::Stopped);
            }
            (false, _) => self.transition(PlaybackState::Stopped),
        }
    }

    /// Stop without moving the playhead (playhead at the very end).
    fn halt(&mut self) {
        match self.state {
            PlaybackState::Playing => {
                self.backend.pause();
                self.transition(PlaybackState::Stopped);
            }
            PlaybackState::SeekPending { .. } => self.transition(PlaybackState::Stopped),
            PlaybackState::Idle | PlaybackState::Stopped => {}
        }
    }

    /// The bound resource ran past its segment's `trim_end`.
    fn advance_past(&mut self, finished: SegmentId) {
        let next = self.engine.next_after(finished).copied();
        match next {
            Some(span) => {
                self.current_time = span.global_start;
                match self.engine.resolve(span.global_start) {
                    Some(target) => self.rebind(target, true),
                    None => self.finish_sequence(),
                }
            }
            None => self.finish_sequence(),
        }
        self.sync_audio(true);
    }

    fn finish_sequence(&mut self) {
        self.backend.pause();
        self.current_time = 0.0;
        self.transition(PlaybackState::Stopped);
        self.notifications.push(Notification::EndOfSequence);
        tracing::info!("end of sequence");
    }

    /// Re-establish invariants after the segment list or a trim changed.
    /// `before` is what the playhead resolved to prior to the edit.
    fn resync(&mut self, before: Option<Resolved>) {
        if self.engine.is_empty() {
            self.release_binding();
            self.current_time = 0.0;
            self.transition(PlaybackState::Idle);
            self.sync_audio(true);
            return;
        }

        let total = self.engine.total_duration();
        if self.current_time > total {
            tracing::debug!(from = self.current_time, to = total, "clamping playhead to new duration");
            self.current_time = total;
        }

        let resume = self.state.is_playing();
        match self.engine.resolve(self.current_time) {
            None => {
                self.cancel_pending_load();
                self.halt();
            }
            Some(target) => {
                let bound = self
                    .binding
                    .as_ref()
                    .map(|b| (b.segment_id(), b.status, b.request.local_time));
                match bound {
                    Some((segment, status, requested)) if segment == target.segment_id => {
                        match status {
                            BindingStatus::Ready => {
                                let unmoved = before.is_some_and(|b| {
                                    b.segment_id == target.segment_id
                                        && (b.local_time - target.local_time).abs() < TIME_EPSILON
                                });
                                if !unmoved {
                                    self.reposition(target.local_time);
                                }
                            }
                            BindingStatus::Loading => {
                                if (requested - target.local_time).abs() >= TIME_EPSILON {
                                    self.rebind(target, resume);
                                }
                            }
                            BindingStatus::Failed => {}
                        }
                    }
                    Some((_, BindingStatus::Failed, _)) if !resume => {}
                    Some(_) => self.rebind(target, resume),
                    None if resume => self.rebind(target, true),
                    None => {}
                }
            }
        }
        self.sync_audio(true);
    }

    fn sync_audio(&mut self, repositioned: bool) {
        let running = self.state == PlaybackState::Playing;
        self.audio
            .reconcile(self.current_time, running, repositioned, &mut self.backend);
    }
}
