#![forbid(unsafe_code)]

//! Pointer-driven panning with inertial release.
//!
//! [`PanController`] owns the pan offset and the single motion source that
//! may write it: either one drag session keyed by pointer id, or one momentum
//! coast. Starting a drag synchronously stops a coast; releasing a drag fast
//! enough starts one. Every write goes through [`PanBounds::clamp`], so the
//! offset never leaves `0 ..= max` on either axis and there is no overshoot.
//!
//! The controller also enforces:
//! - one active pointer at a time,
//! - the configured activation button only,
//! - explicit capture acquire/release commands for hosts
//!   (`setPointerCapture()` / `releasePointerCapture()`), and
//! - cancellation on interruption paths (lost capture, disable, surface loss).
//!
//! Each entry point returns a [`PanDispatch`] with a structured log record,
//! including the reason when the signal was ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::event::{PointerButton, PointerId};
use crate::geometry::{PanBounds, PanOffset, Point};
use crate::momentum::{Momentum, MomentumConfig};
use crate::velocity::{Velocity, VelocityEstimator};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Pan input configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanConfig {
    /// Button required to begin a drag (default: primary).
    pub activation_button: PointerButton,
    /// Whether the host can capture pointers (default: true). Without
    /// capture the collage is static and momentum never starts.
    pub pointer_capture: bool,
}

impl Default for PanConfig {
    fn default() -> Self {
        Self {
            activation_button: PointerButton::Primary,
            pointer_capture: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Requested,
    Acquired,
}

/// Host command for browser pointer-capture control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanCaptureCommand {
    Acquire { pointer_id: PointerId },
    Release { pointer_id: PointerId },
}

/// Lifecycle phase recorded for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanLifecyclePhase {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerCancel,
    LostPointerCapture,
    CaptureAcquired,
    Interrupt,
}

/// Why an incoming signal was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanIgnoredReason {
    /// Input is switched off (view closing or closed).
    Disabled,
    /// No layout exists yet.
    NoSurface,
    /// The host cannot capture pointers.
    CaptureUnavailable,
    ButtonNotAllowed,
    ActivePointerAlreadyInProgress,
    NoActivePointer,
    PointerMismatch,
}

/// Outcome category for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanOutcome {
    DragStarted,
    DragMoved,
    /// Drag finished normally; `momentum` tells whether a coast started.
    DragEnded { momentum: bool },
    /// Drag aborted without momentum.
    DragCancelled,
    MomentumStopped,
    CaptureStateUpdated,
    Ignored(PanIgnoredReason),
}

/// Structured log record for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanLogEntry {
    pub phase: PanLifecyclePhase,
    /// Sequence number of accepted dispatches; `None` when ignored.
    pub sequence: Option<u64>,
    pub pointer_id: Option<PointerId>,
    pub position: Option<Point>,
    /// Offset after the dispatch.
    pub offset: PanOffset,
    pub capture_command: Option<PanCaptureCommand>,
    pub outcome: PanOutcome,
}

/// Result of one pan lifecycle dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanDispatch {
    pub capture_command: Option<PanCaptureCommand>,
    /// A running coast was stopped by this dispatch.
    pub momentum_interrupted: bool,
    pub log: PanLogEntry,
}

impl PanDispatch {
    #[inline]
    pub fn is_ignored(&self) -> bool {
        matches!(self.log.outcome, PanOutcome::Ignored(_))
    }

    /// Reason the signal was ignored, if it was.
    #[inline]
    pub fn ignored_reason(&self) -> Option<PanIgnoredReason> {
        match self.log.outcome {
            PanOutcome::Ignored(reason) => Some(reason),
            _ => None,
        }
    }

    /// A coast started as a result of this dispatch.
    #[inline]
    pub fn momentum_started(&self) -> bool {
        matches!(self.log.outcome, PanOutcome::DragEnded { momentum: true })
    }
}

/// Which source currently owns the offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanMotion {
    Idle,
    Dragging,
    Coasting,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct DragSession {
    pointer_id: PointerId,
    origin: Point,
    baseline: PanOffset,
    estimator: VelocityEstimator,
    capture: CaptureState,
}

impl DragSession {
    fn release_command(&self) -> Option<PanCaptureCommand> {
        (self.capture == CaptureState::Acquired).then_some(PanCaptureCommand::Release {
            pointer_id: self.pointer_id,
        })
    }
}

#[derive(Debug, Clone)]
enum Motion {
    Idle,
    Dragging(DragSession),
    Coasting(Momentum),
}

/// Owner of the pan offset and its velocity.
#[derive(Debug, Clone)]
pub struct PanController {
    config: PanConfig,
    momentum: MomentumConfig,
    bounds: Option<PanBounds>,
    offset: PanOffset,
    motion: Motion,
    enabled: bool,
    next_sequence: u64,
}

impl Default for PanController {
    fn default() -> Self {
        Self::new(PanConfig::default(), MomentumConfig::default())
    }
}

impl PanController {
    /// A controller with no surface yet. It starts enabled.
    #[must_use]
    pub fn new(config: PanConfig, momentum: MomentumConfig) -> Self {
        Self {
            config,
            momentum,
            bounds: None,
            offset: PanOffset::ZERO,
            motion: Motion::Idle,
            enabled: true,
            next_sequence: 1,
        }
    }

    #[inline]
    pub const fn config(&self) -> &PanConfig {
        &self.config
    }

    #[inline]
    pub const fn momentum_config(&self) -> &MomentumConfig {
        &self.momentum
    }

    #[inline]
    pub fn offset(&self) -> PanOffset {
        self.offset
    }

    #[inline]
    pub fn bounds(&self) -> Option<PanBounds> {
        self.bounds
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Velocity in offset space (px/ms). Zero while idle.
    pub fn velocity(&self) -> Velocity {
        match &self.motion {
            Motion::Idle => Velocity::ZERO,
            Motion::Dragging(session) => session.estimator.velocity().negated(),
            Motion::Coasting(momentum) => momentum.velocity(),
        }
    }

    pub fn motion(&self) -> PanMotion {
        match self.motion {
            Motion::Idle => PanMotion::Idle,
            Motion::Dragging(_) => PanMotion::Dragging,
            Motion::Coasting(_) => PanMotion::Coasting,
        }
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        matches!(self.motion, Motion::Dragging(_))
    }

    #[inline]
    pub fn is_coasting(&self) -> bool {
        matches!(self.motion, Motion::Coasting(_))
    }

    /// Active pointer ID, if any.
    pub fn active_pointer_id(&self) -> Option<PointerId> {
        match &self.motion {
            Motion::Dragging(session) => Some(session.pointer_id),
            _ => None,
        }
    }

    /// Replace the travel range. `None` removes the surface and aborts any
    /// motion; `Some` re-clamps the current offset.
    pub fn set_bounds(&mut self, bounds: Option<PanBounds>) -> Option<PanCaptureCommand> {
        self.bounds = bounds;
        match bounds {
            Some(bounds) => {
                self.offset = bounds.clamp(self.offset);
                None
            }
            None => {
                let command = self.interrupt().capture_command;
                self.offset = PanOffset::ZERO;
                command
            }
        }
    }

    /// Allow or refuse new drags. Disabling aborts any drag or coast.
    pub fn set_enabled(&mut self, enabled: bool) -> Option<PanCaptureCommand> {
        self.enabled = enabled;
        if enabled {
            None
        } else {
            self.interrupt().capture_command
        }
    }

    /// Move to `offset` (clamped). Stops a coast; a running drag keeps its
    /// pointer and continues from the new position.
    pub fn jump_to(&mut self, offset: PanOffset) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let target = bounds.clamp(offset);
        match &mut self.motion {
            Motion::Coasting(_) => self.motion = Motion::Idle,
            Motion::Dragging(session) => {
                session.baseline.x += target.x - self.offset.x;
                session.baseline.y += target.y - self.offset.y;
            }
            Motion::Idle => {}
        }
        self.offset = target;
    }

    /// Drop everything: surface, offset, velocity and any active pointer.
    pub fn reset(&mut self) -> Option<PanCaptureCommand> {
        let command = self.set_bounds(None);
        self.next_sequence = 1;
        command
    }

    /// Handle pointer-down on the collage surface.
    pub fn pointer_down(
        &mut self,
        pointer_id: PointerId,
        button: PointerButton,
        position: Point,
        now: Duration,
    ) -> PanDispatch {
        let phase = PanLifecyclePhase::PointerDown;
        let rejection = if !self.enabled {
            Some(PanIgnoredReason::Disabled)
        } else if self.bounds.is_none() {
            Some(PanIgnoredReason::NoSurface)
        } else if !self.config.pointer_capture {
            Some(PanIgnoredReason::CaptureUnavailable)
        } else if button != self.config.activation_button {
            Some(PanIgnoredReason::ButtonNotAllowed)
        } else if self.is_dragging() {
            Some(PanIgnoredReason::ActivePointerAlreadyInProgress)
        } else {
            None
        };
        if let Some(reason) = rejection {
            return self.ignored(phase, reason, Some(pointer_id), Some(position));
        }

        let momentum_interrupted = self.is_coasting();
        let mut estimator =
            VelocityEstimator::new(self.momentum.smoothing, self.momentum.min_sample_interval_ms);
        estimator.reset(position, now);
        self.motion = Motion::Dragging(DragSession {
            pointer_id,
            origin: position,
            baseline: self.offset,
            estimator,
            capture: CaptureState::Requested,
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "drift.pan",
            pointer_id,
            x = self.offset.x,
            y = self.offset.y,
            momentum_interrupted,
            "drag started"
        );

        self.accepted(
            phase,
            Some(pointer_id),
            Some(position),
            Some(PanCaptureCommand::Acquire { pointer_id }),
            PanOutcome::DragStarted,
            momentum_interrupted,
        )
    }

    /// Mark host pointer capture as acquired for the active pointer.
    pub fn capture_acquired(&mut self, pointer_id: PointerId) -> PanDispatch {
        let phase = PanLifecyclePhase::CaptureAcquired;
        let session = match self.session_for(pointer_id) {
            Ok(session) => session,
            Err(reason) => return self.ignored(phase, reason, Some(pointer_id), None),
        };
        session.capture = CaptureState::Acquired;
        self.accepted(
            phase,
            Some(pointer_id),
            None,
            None,
            PanOutcome::CaptureStateUpdated,
            false,
        )
    }

    /// Handle pointer-move. New offset = baseline − (position − origin), clamped.
    pub fn pointer_move(
        &mut self,
        pointer_id: PointerId,
        position: Point,
        now: Duration,
    ) -> PanDispatch {
        let phase = PanLifecyclePhase::PointerMove;
        let bounds = self.bounds.unwrap_or_default();
        let session = match self.session_for(pointer_id) {
            Ok(session) => session,
            Err(reason) => {
                return self.ignored(phase, reason, Some(pointer_id), Some(position));
            }
        };
        session.estimator.sample(position, now);
        let target = PanOffset::new(
            session.baseline.x - (position.x - session.origin.x),
            session.baseline.y - (position.y - session.origin.y),
        );
        self.offset = bounds.clamp(target);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "drift.pan",
            pointer_id,
            x = self.offset.x,
            y = self.offset.y,
            "drag moved"
        );

        self.accepted(
            phase,
            Some(pointer_id),
            Some(position),
            None,
            PanOutcome::DragMoved,
            false,
        )
    }

    /// Handle pointer-up; a fast enough release hands off to momentum.
    pub fn pointer_up(&mut self, pointer_id: PointerId, now: Duration) -> PanDispatch {
        self.end_drag(PanLifecyclePhase::PointerUp, pointer_id, now)
    }

    /// Handle pointer-cancel. Treated like a release.
    pub fn pointer_cancel(&mut self, pointer_id: PointerId, now: Duration) -> PanDispatch {
        self.end_drag(PanLifecyclePhase::PointerCancel, pointer_id, now)
    }

    /// Handle loss of pointer capture: the drag ends without momentum and no
    /// release command is issued.
    pub fn lost_pointer_capture(&mut self, pointer_id: PointerId) -> PanDispatch {
        let phase = PanLifecyclePhase::LostPointerCapture;
        if let Err(reason) = self.session_for(pointer_id) {
            return self.ignored(phase, reason, Some(pointer_id), None);
        }
        self.motion = Motion::Idle;

        #[cfg(feature = "tracing")]
        tracing::debug!(target: "drift.pan", pointer_id, "drag cancelled: capture lost");

        self.accepted(
            phase,
            Some(pointer_id),
            None,
            None,
            PanOutcome::DragCancelled,
            false,
        )
    }

    /// Stop whatever owns the offset, synchronously and without momentum.
    pub fn interrupt(&mut self) -> PanDispatch {
        let phase = PanLifecyclePhase::Interrupt;
        match std::mem::replace(&mut self.motion, Motion::Idle) {
            Motion::Idle => self.ignored(phase, PanIgnoredReason::NoActivePointer, None, None),
            Motion::Dragging(session) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    target: "drift.pan",
                    pointer_id = session.pointer_id,
                    "drag interrupted"
                );
                self.accepted(
                    phase,
                    Some(session.pointer_id),
                    None,
                    session.release_command(),
                    PanOutcome::DragCancelled,
                    false,
                )
            }
            Motion::Coasting(_) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(target: "drift.pan", "momentum interrupted");
                self.accepted(phase, None, None, None, PanOutcome::MomentumStopped, true)
            }
        }
    }

    /// Advance momentum by one frame. Returns `true` while still coasting.
    pub fn tick(&mut self) -> bool {
        let Motion::Coasting(momentum) = &mut self.motion else {
            return false;
        };
        let Some(bounds) = self.bounds else {
            self.motion = Motion::Idle;
            return false;
        };
        let running = momentum.tick(&mut self.offset, &bounds, &self.momentum);
        if !running {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: "drift.pan",
                ticks = momentum.ticks(),
                x = self.offset.x,
                y = self.offset.y,
                "momentum settled"
            );
            self.motion = Motion::Idle;
        }
        running
    }

    fn end_drag(
        &mut self,
        phase: PanLifecyclePhase,
        pointer_id: PointerId,
        now: Duration,
    ) -> PanDispatch {
        if let Err(reason) = self.session_for(pointer_id) {
            return self.ignored(phase, reason, Some(pointer_id), None);
        }
        let Motion::Dragging(session) = std::mem::replace(&mut self.motion, Motion::Idle) else {
            return self.ignored(
                phase,
                PanIgnoredReason::NoActivePointer,
                Some(pointer_id),
                None,
            );
        };

        let release = session
            .estimator
            .release(now, self.momentum.stale_velocity_ms)
            .negated();
        let momentum = Momentum::start(release, &self.momentum);
        let started = momentum.is_some();
        if let Some(momentum) = momentum {
            self.motion = Motion::Coasting(momentum);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "drift.pan",
            pointer_id,
            vx = release.vx,
            vy = release.vy,
            momentum = started,
            "drag ended"
        );

        self.accepted(
            phase,
            Some(pointer_id),
            None,
            session.release_command(),
            PanOutcome::DragEnded { momentum: started },
            false,
        )
    }

    fn session_for(
        &mut self,
        pointer_id: PointerId,
    ) -> Result<&mut DragSession, PanIgnoredReason> {
        match &mut self.motion {
            Motion::Dragging(session) if session.pointer_id == pointer_id => Ok(session),
            Motion::Dragging(_) => Err(PanIgnoredReason::PointerMismatch),
            _ => Err(PanIgnoredReason::NoActivePointer),
        }
    }

    fn ignored(
        &self,
        phase: PanLifecyclePhase,
        reason: PanIgnoredReason,
        pointer_id: Option<PointerId>,
        position: Option<Point>,
    ) -> PanDispatch {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "drift.pan",
            ?phase,
            ?reason,
            ?pointer_id,
            "pointer signal ignored"
        );
        PanDispatch {
            capture_command: None,
            momentum_interrupted: false,
            log: PanLogEntry {
                phase,
                sequence: None,
                pointer_id,
                position,
                offset: self.offset,
                capture_command: None,
                outcome: PanOutcome::Ignored(reason),
            },
        }
    }

    fn accepted(
        &mut self,
        phase: PanLifecyclePhase,
        pointer_id: Option<PointerId>,
        position: Option<Point>,
        capture_command: Option<PanCaptureCommand>,
        outcome: PanOutcome,
        momentum_interrupted: bool,
    ) -> PanDispatch {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        PanDispatch {
            capture_command,
            momentum_interrupted,
            log: PanLogEntry {
                phase,
                sequence: Some(sequence),
                pointer_id,
                position,
                offset: self.offset,
                capture_command,
                outcome,
            },
        }
    }
}
