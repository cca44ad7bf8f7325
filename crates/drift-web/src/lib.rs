#![forbid(unsafe_code)]

//! `drift-web` drives the collage viewer from a web host.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes encoded
//!   events and asks for frames; nothing here touches the DOM.
//! - **Deterministic time**: the host advances a monotonic clock explicitly,
//!   so a recorded session replays to identical output.
//! - **JSON out**: each frame yields a [`FrameOutput`] the renderer applies
//!   as-is (flags, pan offset, layout when it changed, host commands and
//!   image loads to start).
//!
//! On `wasm32` the [`wasm`] module wraps [`WebHost`] for `wasm-bindgen`.

pub mod input_parser;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

use std::time::Duration;

use drift_core::{ManualFrameScheduler, PanOffset, Velocity};
use drift_layout::CollageLayout;
use drift_runtime::{
    CollageViewer, ConfigError, HostCommand, LoadRequest, ProbeCompletion, ProbeError,
    QueuedImageLoader, ViewFlags, ViewPhase, ViewerConfig,
};
use serde::Serialize;
use thiserror::Error;

pub use input_parser::{HostEvent, InputParseError, TimedHostEvent, parse_host_event};

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time. Time never moves backwards.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }
}

/// Everything the renderer needs after one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutput {
    pub time_ms: f64,
    /// Flag commit counter; changes whenever `flags` was committed.
    pub commit: u64,
    pub phase: ViewPhase,
    pub flags: ViewFlags,
    pub offset: PanOffset,
    pub velocity: Velocity,
    pub layout_revision: u64,
    /// Present only when the layout changed since the previous output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<CollageLayout>,
    pub commands: Vec<HostCommand>,
    pub load_requests: Vec<LoadRequest>,
    /// The viewer wants another frame.
    pub animating: bool,
}

impl FrameOutput {
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A replay script line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {source}")]
pub struct ReplayError {
    pub line: usize,
    #[source]
    pub source: InputParseError,
}

type HostedViewer = CollageViewer<ManualFrameScheduler, QueuedImageLoader>;

/// Host-driven collage viewer.
#[derive(Debug)]
pub struct WebHost {
    clock: DeterministicClock,
    viewer: HostedViewer,
    sent_revision: u64,
}

impl WebHost {
    /// Create a host around a closed viewer.
    pub fn new(config: ViewerConfig) -> Result<Self, ConfigError> {
        let viewer =
            CollageViewer::new(config, ManualFrameScheduler::new(), QueuedImageLoader::new())?;
        Ok(Self {
            clock: DeterministicClock::new(),
            viewer,
            sent_revision: 0,
        })
    }

    pub fn clock(&self) -> &DeterministicClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut DeterministicClock {
        &mut self.clock
    }

    pub fn viewer(&self) -> &HostedViewer {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut HostedViewer {
        &mut self.viewer
    }

    /// Parse and apply one encoded event. Frame events return their output.
    pub fn push_encoded(&mut self, json: &str) -> Result<Option<FrameOutput>, InputParseError> {
        let Some(TimedHostEvent { at, event }) = parse_host_event(json)? else {
            return Ok(None);
        };
        if let Some(at) = at {
            self.clock.set(at);
        }
        Ok(self.dispatch(event))
    }

    /// Apply one event at the current clock time.
    pub fn dispatch(&mut self, event: HostEvent) -> Option<FrameOutput> {
        let now = self.clock.now();
        match event {
            HostEvent::Open { subject, images } => self.viewer.open(subject, images),
            HostEvent::Close => {
                self.viewer.close(now);
            }
            HostEvent::Resize { width, height } => self.viewer.resize(width, height),
            HostEvent::PointerDown {
                pointer_id,
                button,
                position,
            } => {
                self.viewer.pointer_down(pointer_id, button, position, now);
            }
            HostEvent::PointerMove {
                pointer_id,
                position,
            } => {
                self.viewer.pointer_move(pointer_id, position, now);
            }
            HostEvent::PointerUp { pointer_id } => {
                self.viewer.pointer_up(pointer_id, now);
            }
            HostEvent::PointerCancel { pointer_id } => {
                self.viewer.pointer_cancel(pointer_id, now);
            }
            HostEvent::LostPointerCapture { pointer_id } => {
                self.viewer.lost_pointer_capture(pointer_id);
            }
            HostEvent::CaptureAcquired { pointer_id } => {
                self.viewer.capture_acquired(pointer_id);
            }
            HostEvent::Key { key } => {
                self.viewer.on_key(&key, now);
            }
            HostEvent::ImageLoaded {
                generation,
                slot,
                width,
                height,
            } => {
                self.viewer.on_image_loaded(ProbeCompletion {
                    generation,
                    slot,
                    outcome: Ok((width, height)),
                });
            }
            HostEvent::ImageFailed {
                generation,
                slot,
                image_id,
                message,
            } => {
                let image_id = image_id.unwrap_or_else(|| format!("slot {slot}"));
                self.viewer.on_image_loaded(ProbeCompletion {
                    generation,
                    slot,
                    outcome: Err(ProbeError::Unavailable { image_id, message }),
                });
            }
            HostEvent::Frame => return Some(self.frame()),
        }
        None
    }

    /// Deliver the pending frame callback (if any) and collect the output.
    pub fn frame(&mut self) -> FrameOutput {
        let now = self.clock.now();
        for token in self.viewer.scheduler_mut().take_pending() {
            self.viewer.on_frame(token, now);
        }
        self.output()
    }

    /// Output for the current state without running a frame.
    pub fn output(&mut self) -> FrameOutput {
        let snapshot = self.viewer.snapshot();
        let layout = if snapshot.layout_revision == self.sent_revision {
            None
        } else {
            self.sent_revision = snapshot.layout_revision;
            self.viewer.layout().cloned()
        };
        let output = FrameOutput {
            time_ms: self.clock.now().as_secs_f64() * 1000.0,
            commit: snapshot.commit,
            phase: snapshot.phase,
            flags: snapshot.flags,
            offset: snapshot.offset,
            velocity: snapshot.velocity,
            layout_revision: snapshot.layout_revision,
            layout,
            commands: self.viewer.drain_commands(),
            load_requests: self.viewer.loader_mut().drain_requests(),
            animating: snapshot.frame_pending,
        };
        tracing::trace!(
            target: "drift.web",
            commit = output.commit,
            commands = output.commands.len(),
            loads = output.load_requests.len(),
            "frame output"
        );
        output
    }

    /// Run a JSONL script of encoded events, one per line. Blank lines and
    /// lines starting with `#` are skipped. Returns one output per frame
    /// event.
    pub fn replay_jsonl(&mut self, script: &str) -> Result<Vec<FrameOutput>, ReplayError> {
        let mut outputs = Vec::new();
        for (index, line) in script.lines().enumerate() {
            let line_text = line.trim();
            if line_text.is_empty() || line_text.starts_with('#') {
                continue;
            }
            let output = self.push_encoded(line_text).map_err(|source| {
                tracing::debug!(
                    target: "drift.web",
                    line = index + 1,
                    %source,
                    "replay line rejected"
                );
                ReplayError {
                    line: index + 1,
                    source,
                }
            })?;
            outputs.extend(output);
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let mut clock = DeterministicClock::new();
        clock.set(Duration::from_millis(50));
        clock.set(Duration::from_millis(20));
        assert_eq!(clock.now(), Duration::from_millis(50));
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.now(), Duration::from_millis(55));
    }

    #[test]
    fn layout_is_sent_once_per_revision() {
        let mut host = WebHost::new(ViewerConfig::default()).expect("host");
        host.dispatch(HostEvent::Resize {
            width: 800.0,
            height: 600.0,
        });
        host.dispatch(HostEvent::Open {
            subject: "once".into(),
            images: vec!["a.jpg".into()],
        });
        let first = host.frame();
        let request = first.load_requests[0].clone();
        host.viewer_mut()
            .on_image_loaded(ProbeCompletion::loaded(&request, 10, 10));

        host.clock_mut().set(Duration::from_millis(400));
        let revealed = host.frame();
        assert!(revealed.layout.is_some());
        assert!(host.output().layout.is_none());
    }

    #[test]
    fn unknown_events_are_ignored() {
        let mut host = WebHost::new(ViewerConfig::default()).expect("host");
        assert_eq!(host.push_encoded(r#"{"kind":"focus"}"#), Ok(None));
    }

    #[test]
    fn replay_reports_line_numbers() {
        let mut host = WebHost::new(ViewerConfig::default()).expect("host");
        let err = host
            .replay_jsonl("# comment\n{\"kind\":\"frame\"}\n\n{\"kind\":\"resize\"}\n")
            .expect_err("missing width");
        assert_eq!(err.line, 4);
        assert_eq!(err.source, InputParseError::MissingField("width"));
    }
}
