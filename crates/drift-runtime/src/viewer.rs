#![forbid(unsafe_code)]

//! View lifecycle coordination for the collage viewer.
//!
//! [`CollageViewer`] owns everything one open collage needs: the subject,
//! the metrics probe, the current layout and the pan controller. It walks a
//! four-phase machine driven by host calls and frame callbacks:
//!
//! ```text
//!            open()            entry delay            close() / Esc          exit delay
//!  Closed ─────────▶ Opening ─────────────▶ ContentVisible ─────────▶ Closing ─────────▶ Closed
//!                       ▲                                                │
//!                       └───────────────────── open() ◀─────────────────┘
//! ```
//!
//! # Commits
//!
//! Every change to [`ViewFlags`] bumps the commit counter. Opening always
//! produces two distinct commits: a hidden-state commit during `open()` and a
//! visible-state commit on the next frame, so an entrance transition has a
//! starting state to animate from.
//!
//! # Host commands
//!
//! Side effects outside the collage are queued as [`HostCommand`]s and
//! drained by the host: page-scroll lock and key listening while open,
//! pointer capture around drags. Image loads go through the [`ImageLoader`].
//!
//! # Cancellation
//!
//! Closing or replacing the subject cancels the probe generation and stops
//! any drag or coast synchronously. Frame callbacks carry a [`FrameToken`];
//! callbacks for tokens the viewer no longer holds are ignored.

use std::time::Duration;

use drift_core::{
    FrameScheduler, FrameToken, KeyCode, PanCaptureCommand, PanController, PanDispatch,
    PanMotion, PanOffset, Point, PointerButton, PointerId, Size, Velocity,
};
use drift_layout::{CollageLayout, ImageMetrics, compute_layout, subject_seed};
use serde::{Deserialize, Serialize};

use crate::config::ViewerConfig;
use crate::error::{ConfigError, Result};
use crate::generation::Generation;
use crate::prober::{ImageLoader, MetricsProber, ProbeCompletion, ProbeProgress};

// ---------------------------------------------------------------------------
// Public state
// ---------------------------------------------------------------------------

/// Lifecycle phase of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewPhase {
    #[default]
    Closed,
    /// Shell visible, content still hidden.
    Opening,
    ContentVisible,
    /// Exit transition running; input is refused.
    Closing,
}

impl ViewPhase {
    /// Whether `close()` has something to close.
    #[inline]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Opening | Self::ContentVisible)
    }

    #[inline]
    pub fn is_animating(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }
}

/// Presentation flags the renderer binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewFlags {
    pub visible: bool,
    pub content_visible: bool,
    pub closing: bool,
}

/// Side effect requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostCommand {
    LockPageScroll,
    UnlockPageScroll,
    ListenKeys,
    UnlistenKeys,
    AcquirePointerCapture { pointer_id: PointerId },
    ReleasePointerCapture { pointer_id: PointerId },
}

impl From<PanCaptureCommand> for HostCommand {
    fn from(command: PanCaptureCommand) -> Self {
        match command {
            PanCaptureCommand::Acquire { pointer_id } => Self::AcquirePointerCapture { pointer_id },
            PanCaptureCommand::Release { pointer_id } => Self::ReleasePointerCapture { pointer_id },
        }
    }
}

/// What the viewer is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub image_ids: Vec<String>,
}

/// Read-only view of the viewer state for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewerSnapshot {
    pub phase: ViewPhase,
    pub flags: ViewFlags,
    pub commit: u64,
    pub offset: PanOffset,
    pub velocity: Velocity,
    pub motion: PanMotion,
    pub layout_revision: u64,
    pub frame_pending: bool,
}

// ---------------------------------------------------------------------------
// Viewer
// ---------------------------------------------------------------------------

/// Lifecycle coordinator for one collage view.
#[derive(Debug)]
pub struct CollageViewer<S: FrameScheduler, L: ImageLoader> {
    config: ViewerConfig,
    scheduler: S,
    loader: L,
    phase: ViewPhase,
    flags: ViewFlags,
    commit: u64,
    subject: Option<Subject>,
    prober: MetricsProber,
    metrics: Option<Vec<ImageMetrics>>,
    viewport: Size,
    layout: Option<CollageLayout>,
    layout_revision: u64,
    pan: PanController,
    frame: Option<FrameToken>,
    /// Visible-state commit owed on the next frame.
    pending_reveal: bool,
    /// When the running phase transition completes.
    deadline: Option<Duration>,
    /// First layout for the current subject already centred the pan.
    centered: bool,
    scroll_locked: bool,
    keys_listened: bool,
    commands: Vec<HostCommand>,
}

impl<S: FrameScheduler, L: ImageLoader> CollageViewer<S, L> {
    /// Create a closed viewer. Fails if `config` does not validate.
    pub fn new(config: ViewerConfig, scheduler: S, loader: L) -> Result<Self> {
        let errors = config.validate();
        if !errors.is_empty() {
            tracing::warn!(target: "drift.viewer", problems = errors.len(), "config rejected");
            return Err(ConfigError::Validation(errors));
        }
        let mut pan = PanController::new(config.pan, config.momentum);
        pan.set_enabled(false);
        Ok(Self {
            config,
            scheduler,
            loader,
            phase: ViewPhase::Closed,
            flags: ViewFlags::default(),
            commit: 0,
            subject: None,
            prober: MetricsProber::new(),
            metrics: None,
            viewport: Size::default(),
            layout: None,
            layout_revision: 0,
            pan,
            frame: None,
            pending_reveal: false,
            deadline: None,
            centered: false,
            scroll_locked: false,
            keys_listened: false,
            commands: Vec::new(),
        })
    }

    // -- Accessors ----------------------------------------------------------

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub fn flags(&self) -> ViewFlags {
        self.flags
    }

    /// Number of flag commits so far.
    pub fn commit(&self) -> u64 {
        self.commit
    }

    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Metrics of the resolved probe for the current subject.
    pub fn metrics(&self) -> Option<&[ImageMetrics]> {
        self.metrics.as_deref()
    }

    pub fn layout(&self) -> Option<&CollageLayout> {
        self.layout.as_ref()
    }

    /// Bumped whenever the layout is replaced or cleared.
    pub fn layout_revision(&self) -> u64 {
        self.layout_revision
    }

    pub fn offset(&self) -> PanOffset {
        self.pan.offset()
    }

    pub fn velocity(&self) -> Velocity {
        self.pan.velocity()
    }

    pub fn pan(&self) -> &PanController {
        &self.pan
    }

    /// Generation of the latest probe batch.
    pub fn probe_generation(&self) -> Generation {
        self.prober.current_generation()
    }

    pub fn is_probing(&self) -> bool {
        self.prober.is_pending()
    }

    /// Frame callback the viewer is waiting for.
    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.frame
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    /// Take the queued host commands, oldest first.
    pub fn drain_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.commands)
    }

    #[must_use]
    pub fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            phase: self.phase,
            flags: self.flags,
            commit: self.commit,
            offset: self.pan.offset(),
            velocity: self.pan.velocity(),
            motion: self.pan.motion(),
            layout_revision: self.layout_revision,
            frame_pending: self.frame.is_some(),
        }
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Show `subject_id` with its images.
    ///
    /// From `Closed` this starts the opening sequence. While open it swaps
    /// the subject in place, keeping the phase. While closing it restarts
    /// the opening sequence. Opening the subject already shown is a no-op.
    pub fn open(&mut self, subject_id: impl Into<String>, image_ids: Vec<String>) {
        let subject = Subject {
            id: subject_id.into(),
            image_ids,
        };
        match self.phase {
            ViewPhase::Closed => {
                self.install_hooks();
                self.begin_opening();
            }
            ViewPhase::Closing => self.begin_opening(),
            ViewPhase::Opening | ViewPhase::ContentVisible => {
                if self.subject.as_ref() == Some(&subject) {
                    return;
                }
                tracing::debug!(
                    target: "drift.viewer",
                    subject = %subject.id,
                    "subject replaced"
                );
                self.reset_collage();
            }
        }

        let progress = self.prober.begin(&subject.image_ids, &mut self.loader);
        self.subject = Some(subject);
        self.apply_probe(&progress);
        self.sync_frame();
    }

    /// Start the exit transition. Returns `false` when nothing is open.
    pub fn close(&mut self, now: Duration) -> bool {
        if !self.phase.is_open() {
            return false;
        }
        self.set_phase(ViewPhase::Closing);
        self.flags = ViewFlags {
            visible: false,
            content_visible: false,
            closing: true,
        };
        self.commit_flags();
        self.pending_reveal = false;
        self.prober.cancel(&mut self.loader);
        let command = self.pan.set_enabled(false);
        self.push_capture(command);
        let exit_delay = millis(self.config.lifecycle.exit_delay_ms);
        self.deadline = Some(now.saturating_add(exit_delay));
        self.sync_frame();
        true
    }

    /// Key press from the host's key listener. Escape closes.
    pub fn on_key(&mut self, key: &KeyCode, now: Duration) -> bool {
        if self.keys_listened && key.is_escape() {
            return self.close(now);
        }
        false
    }

    /// Viewport size notification. Unmeasured sizes defer layout.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Size::new(width, height);
        if !self.viewport.is_measured() {
            tracing::debug!(
                target: "drift.viewer",
                width,
                height,
                "viewport not measured; layout deferred"
            );
            return;
        }
        self.try_layout();
    }

    /// Load result from the host.
    pub fn on_image_loaded(&mut self, completion: ProbeCompletion) -> ProbeProgress {
        let progress = self.prober.complete(completion);
        self.apply_probe(&progress);
        progress
    }

    /// Frame callback. Returns `false` for tokens the viewer no longer holds.
    pub fn on_frame(&mut self, token: FrameToken, now: Duration) -> bool {
        if self.frame != Some(token) {
            tracing::trace!(target: "drift.viewer", token = token.id(), "stale frame ignored");
            return false;
        }
        self.frame = None;

        if self.pending_reveal {
            self.pending_reveal = false;
            self.flags.visible = true;
            self.commit_flags();
            let entry_delay = millis(self.config.lifecycle.entry_delay_ms);
            self.deadline = Some(now.saturating_add(entry_delay));
        }

        if self.deadline.is_some_and(|deadline| now >= deadline) {
            self.deadline = None;
            match self.phase {
                ViewPhase::Opening => self.reveal_content(),
                ViewPhase::Closing => self.finish_close(),
                ViewPhase::Closed | ViewPhase::ContentVisible => {}
            }
        }

        if self.pan.is_coasting() {
            self.pan.tick();
        }

        self.sync_frame();
        true
    }

    // -- Pointer input ------------------------------------------------------

    pub fn pointer_down(
        &mut self,
        pointer_id: PointerId,
        button: PointerButton,
        position: Point,
        now: Duration,
    ) -> PanDispatch {
        let dispatch = self.pan.pointer_down(pointer_id, button, position, now);
        self.after_pan(&dispatch);
        dispatch
    }

    pub fn capture_acquired(&mut self, pointer_id: PointerId) -> PanDispatch {
        let dispatch = self.pan.capture_acquired(pointer_id);
        self.after_pan(&dispatch);
        dispatch
    }

    pub fn pointer_move(
        &mut self,
        pointer_id: PointerId,
        position: Point,
        now: Duration,
    ) -> PanDispatch {
        let dispatch = self.pan.pointer_move(pointer_id, position, now);
        self.after_pan(&dispatch);
        dispatch
    }

    pub fn pointer_up(&mut self, pointer_id: PointerId, now: Duration) -> PanDispatch {
        let dispatch = self.pan.pointer_up(pointer_id, now);
        self.after_pan(&dispatch);
        dispatch
    }

    pub fn pointer_cancel(&mut self, pointer_id: PointerId, now: Duration) -> PanDispatch {
        let dispatch = self.pan.pointer_cancel(pointer_id, now);
        self.after_pan(&dispatch);
        dispatch
    }

    pub fn lost_pointer_capture(&mut self, pointer_id: PointerId) -> PanDispatch {
        let dispatch = self.pan.lost_pointer_capture(pointer_id);
        self.after_pan(&dispatch);
        dispatch
    }

    // -- Internals ----------------------------------------------------------

    fn set_phase(&mut self, phase: ViewPhase) {
        tracing::debug!(
            target: "drift.viewer",
            from = ?self.phase,
            to = ?phase,
            "phase transition"
        );
        self.phase = phase;
    }

    fn commit_flags(&mut self) {
        self.commit += 1;
        tracing::trace!(
            target: "drift.viewer",
            commit = self.commit,
            visible = self.flags.visible,
            content_visible = self.flags.content_visible,
            closing = self.flags.closing,
            "flags committed"
        );
    }

    /// Hidden-state commit now, visible-state commit on the next frame.
    fn begin_opening(&mut self) {
        self.set_phase(ViewPhase::Opening);
        self.reset_collage();
        self.flags = ViewFlags::default();
        self.commit_flags();
        self.pending_reveal = true;
        self.deadline = None;
    }

    fn reveal_content(&mut self) {
        self.set_phase(ViewPhase::ContentVisible);
        self.flags.content_visible = true;
        self.commit_flags();
        let command = self.pan.set_enabled(true);
        self.push_capture(command);
        self.try_layout();
    }

    fn finish_close(&mut self) {
        self.set_phase(ViewPhase::Closed);
        self.flags = ViewFlags::default();
        self.commit_flags();
        self.reset_collage();
        self.subject = None;
        self.remove_hooks();
    }

    /// Drop probe, metrics, layout and pan state for the current subject.
    fn reset_collage(&mut self) {
        self.prober.cancel(&mut self.loader);
        self.metrics = None;
        if self.layout.take().is_some() {
            self.layout_revision += 1;
        }
        let command = self.pan.reset();
        self.push_capture(command);
        self.centered = false;
    }

    fn apply_probe(&mut self, progress: &ProbeProgress) {
        if let ProbeProgress::Resolved(metrics) = progress {
            self.metrics = Some(metrics.clone());
            self.try_layout();
        }
    }

    /// Recompute the layout if content is visible and inputs are ready.
    fn try_layout(&mut self) {
        if self.phase != ViewPhase::ContentVisible {
            return;
        }
        let Some(metrics) = self.metrics.as_deref() else {
            return;
        };
        let seed = self.subject.as_ref().map_or(0, |s| subject_seed(&s.id));
        let Some(layout) = compute_layout(self.viewport, metrics, &self.config.layout, seed) else {
            return;
        };
        if self.layout.as_ref() == Some(&layout) {
            return;
        }

        let bounds = layout.pan_bounds();
        self.layout = Some(layout);
        self.layout_revision += 1;
        let command = self.pan.set_bounds(Some(bounds));
        self.push_capture(command);
        if !self.centered {
            if self.config.lifecycle.center_on_first_layout {
                self.pan.jump_to(bounds.center());
            }
            self.centered = true;
        }
        tracing::debug!(
            target: "drift.viewer",
            revision = self.layout_revision,
            max_x = bounds.max_x,
            max_y = bounds.max_y,
            "layout applied"
        );
    }

    fn install_hooks(&mut self) {
        if self.config.lifecycle.lock_page_scroll && !self.scroll_locked {
            self.scroll_locked = true;
            self.commands.push(HostCommand::LockPageScroll);
        }
        if self.config.lifecycle.escape_closes && !self.keys_listened {
            self.keys_listened = true;
            self.commands.push(HostCommand::ListenKeys);
        }
    }

    fn remove_hooks(&mut self) {
        if std::mem::take(&mut self.scroll_locked) {
            self.commands.push(HostCommand::UnlockPageScroll);
        }
        if std::mem::take(&mut self.keys_listened) {
            self.commands.push(HostCommand::UnlistenKeys);
        }
    }

    fn push_capture(&mut self, command: Option<PanCaptureCommand>) {
        if let Some(command) = command {
            self.commands.push(command.into());
        }
    }

    fn after_pan(&mut self, dispatch: &PanDispatch) {
        self.push_capture(dispatch.capture_command);
        self.sync_frame();
    }

    /// Hold a frame request exactly while something is animating.
    fn sync_frame(&mut self) {
        let wanted = self.pending_reveal || self.deadline.is_some() || self.pan.is_coasting();
        match (wanted, self.frame) {
            (true, None) => self.frame = Some(self.scheduler.request_frame()),
            (false, Some(token)) => {
                self.scheduler.cancel_frame(token);
                self.frame = None;
            }
            _ => {}
        }
    }
}

#[inline]
fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
