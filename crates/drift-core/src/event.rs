#![forbid(unsafe_code)]

//! Host input vocabulary: pointer buttons, pointer identifiers and keys.
//!
//! Hosts (a browser bridge, a replay script, tests) translate their native
//! events into these types before handing them to the pan controller or the
//! viewer. Timestamps travel separately as [`std::time::Duration`] since an
//! arbitrary host epoch.

use serde::{Deserialize, Serialize};

/// Host-assigned pointer identifier (DOM `PointerEvent.pointerId`).
pub type PointerId = u32;

/// Pointer button that initiated a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    /// Left mouse button, pen contact or touch.
    Primary,
    /// Wheel / middle button.
    Auxiliary,
    /// Right mouse button.
    Secondary,
    /// Any other button index.
    Other(u8),
}

impl PointerButton {
    /// Map a DOM `PointerEvent.button` index.
    #[must_use]
    pub fn from_dom_index(index: i16) -> Self {
        match index {
            0 => Self::Primary,
            1 => Self::Auxiliary,
            2 => Self::Secondary,
            other => Self::Other(u8::try_from(other).unwrap_or(u8::MAX)),
        }
    }
}

/// Keys the collage viewer distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCode {
    Escape,
    Enter,
    Char(char),
    /// Any other named key, kept verbatim.
    Named(String),
}

impl KeyCode {
    /// Map a DOM `KeyboardEvent.key` value.
    ///
    /// Both the standard `"Escape"` and the legacy `"Esc"` spelling map to
    /// [`KeyCode::Escape`].
    #[must_use]
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Self::Escape,
            "Enter" => Self::Enter,
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => Self::Named(key.to_owned()),
                }
            }
        }
    }

    #[inline]
    pub fn is_escape(&self) -> bool {
        matches!(self, Self::Escape)
    }
}
