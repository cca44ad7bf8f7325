#![forbid(unsafe_code)]

//! JSON input parser for host events.
//!
//! Hosts encode every DOM-side happening as one flat JSON object with a
//! `kind` discriminator and an optional `t` timestamp in milliseconds on the
//! host's monotonic clock:
//!
//! ```json
//! {"kind":"open","subject":"lisbon","images":["tram.jpg","tiles.jpg"]}
//! {"kind":"resize","width":1280,"height":800}
//! {"kind":"pointer_down","t":1016,"pointer_id":1,"button":0,"x":640,"y":400}
//! {"kind":"image_loaded","generation":1,"slot":0,"natural_width":1600,"natural_height":1067}
//! {"kind":"frame","t":1032}
//! ```
//!
//! Unknown kinds parse to `Ok(None)` so older cores ignore newer hosts.

use std::time::Duration;

use drift_core::{KeyCode, Point, PointerButton, PointerId};
use drift_runtime::Generation;
use serde::Deserialize;
use thiserror::Error;

/// Errors from parsing encoded host events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputParseError {
    /// Malformed JSON.
    #[error("JSON parse error: {0}")]
    Json(String),
    /// Missing required field.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// Field present but unusable.
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// One host event.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Open {
        subject: String,
        images: Vec<String>,
    },
    Close,
    Resize {
        width: f64,
        height: f64,
    },
    PointerDown {
        pointer_id: PointerId,
        button: PointerButton,
        position: Point,
    },
    PointerMove {
        pointer_id: PointerId,
        position: Point,
    },
    PointerUp {
        pointer_id: PointerId,
    },
    PointerCancel {
        pointer_id: PointerId,
    },
    LostPointerCapture {
        pointer_id: PointerId,
    },
    CaptureAcquired {
        pointer_id: PointerId,
    },
    Key {
        key: KeyCode,
    },
    ImageLoaded {
        generation: Generation,
        slot: usize,
        width: u32,
        height: u32,
    },
    ImageFailed {
        generation: Generation,
        slot: usize,
        image_id: Option<String>,
        message: String,
    },
    /// The host's animation frame fired.
    Frame,
}

/// A parsed event with its optional host timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedHostEvent {
    pub at: Option<Duration>,
    pub event: HostEvent,
}

#[derive(Debug, Deserialize)]
struct RawHostEvent {
    kind: String,
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    pointer_id: Option<PointerId>,
    #[serde(default)]
    button: Option<i16>,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    generation: Option<u64>,
    #[serde(default)]
    slot: Option<usize>,
    #[serde(default)]
    natural_width: Option<u32>,
    #[serde(default)]
    natural_height: Option<u32>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Parse one JSON-encoded host event.
///
/// Returns `Ok(None)` for kinds this version does not know.
pub fn parse_host_event(json: &str) -> Result<Option<TimedHostEvent>, InputParseError> {
    let raw: RawHostEvent =
        serde_json::from_str(json).map_err(|e| InputParseError::Json(e.to_string()))?;
    let at = raw.t.map(parse_time).transpose()?;

    let event = match raw.kind.as_str() {
        "open" => HostEvent::Open {
            subject: raw.subject.ok_or(InputParseError::MissingField("subject"))?,
            images: raw.images.unwrap_or_default(),
        },
        "close" => HostEvent::Close,
        "resize" => HostEvent::Resize {
            width: raw.width.ok_or(InputParseError::MissingField("width"))?,
            height: raw.height.ok_or(InputParseError::MissingField("height"))?,
        },
        "pointer_down" => HostEvent::PointerDown {
            pointer_id: pointer_id(&raw)?,
            button: PointerButton::from_dom_index(raw.button.unwrap_or(0)),
            position: position(&raw)?,
        },
        "pointer_move" => HostEvent::PointerMove {
            pointer_id: pointer_id(&raw)?,
            position: position(&raw)?,
        },
        "pointer_up" => HostEvent::PointerUp {
            pointer_id: pointer_id(&raw)?,
        },
        "pointer_cancel" => HostEvent::PointerCancel {
            pointer_id: pointer_id(&raw)?,
        },
        "lost_pointer_capture" => HostEvent::LostPointerCapture {
            pointer_id: pointer_id(&raw)?,
        },
        "capture_acquired" => HostEvent::CaptureAcquired {
            pointer_id: pointer_id(&raw)?,
        },
        "key" => HostEvent::Key {
            key: KeyCode::from_dom_key(
                raw.key
                    .as_deref()
                    .ok_or(InputParseError::MissingField("key"))?,
            ),
        },
        "image_loaded" => HostEvent::ImageLoaded {
            generation: generation(&raw)?,
            slot: raw.slot.ok_or(InputParseError::MissingField("slot"))?,
            width: raw
                .natural_width
                .ok_or(InputParseError::MissingField("natural_width"))?,
            height: raw
                .natural_height
                .ok_or(InputParseError::MissingField("natural_height"))?,
        },
        "image_failed" => HostEvent::ImageFailed {
            generation: generation(&raw)?,
            slot: raw.slot.ok_or(InputParseError::MissingField("slot"))?,
            image_id: raw.image,
            message: raw.message.unwrap_or_else(|| "load failed".to_owned()),
        },
        "frame" => HostEvent::Frame,
        _ => {
            tracing::trace!(target: "drift.web", kind = %raw.kind, "unknown host event kind");
            return Ok(None);
        }
    };
    Ok(Some(TimedHostEvent { at, event }))
}

fn parse_time(ms: f64) -> Result<Duration, InputParseError> {
    let invalid = || InputParseError::InvalidValue {
        field: "t",
        value: ms.to_string(),
    };
    if !(ms >= 0.0) {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(ms / 1000.0).map_err(|_| invalid())
}

fn pointer_id(raw: &RawHostEvent) -> Result<PointerId, InputParseError> {
    raw.pointer_id
        .ok_or(InputParseError::MissingField("pointer_id"))
}

fn position(raw: &RawHostEvent) -> Result<Point, InputParseError> {
    let x = raw.x.ok_or(InputParseError::MissingField("x"))?;
    let y = raw.y.ok_or(InputParseError::MissingField("y"))?;
    Ok(Point::new(x, y))
}

fn generation(raw: &RawHostEvent) -> Result<Generation, InputParseError> {
    raw.generation
        .map(Generation::new)
        .ok_or(InputParseError::MissingField("generation"))
}
