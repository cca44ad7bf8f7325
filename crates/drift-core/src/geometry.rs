#![forbid(unsafe_code)]

//! Geometric primitives for the collage surface.
//!
//! All coordinates are CSS pixels as `f64`. Offsets are measured from the
//! top-left corner of the collage segment, so a larger offset moves the
//! viewport further right/down across the content.

use serde::{Deserialize, Serialize};

/// A position in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A size is measured once both dimensions are finite and positive.
    ///
    /// Hosts report `0 × 0` before the first layout pass; such sizes defer
    /// any work that depends on the viewport.
    #[inline]
    pub fn is_measured(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Scroll offset of the viewport across the collage segment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanOffset {
    pub x: f64,
    pub y: f64,
}

impl PanOffset {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Inclusive travel range of a [`PanOffset`]: `0 ..= max` on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanBounds {
    /// Largest horizontal offset (never negative).
    pub max_x: f64,
    /// Largest vertical offset (never negative).
    pub max_y: f64,
}

impl PanBounds {
    /// Bounds for a content segment of `content` size seen through a viewport
    /// of `viewport` size. Content smaller than the viewport yields zero travel.
    #[must_use]
    pub fn for_content(content: Size, viewport: Size) -> Self {
        Self {
            max_x: non_negative(content.width - viewport.width),
            max_y: non_negative(content.height - viewport.height),
        }
    }

    /// Clamp an offset into the travel range. Non-finite components land on 0.
    #[must_use]
    pub fn clamp(&self, offset: PanOffset) -> PanOffset {
        PanOffset {
            x: clamp_axis(offset.x, self.max_x),
            y: clamp_axis(offset.y, self.max_y),
        }
    }

    /// Whether `offset` already lies inside the travel range.
    #[inline]
    pub fn contains(&self, offset: PanOffset) -> bool {
        (0.0..=self.max_x).contains(&offset.x) && (0.0..=self.max_y).contains(&offset.y)
    }

    /// Middle of the travel range.
    #[inline]
    pub fn center(&self) -> PanOffset {
        PanOffset::new(self.max_x / 2.0, self.max_y / 2.0)
    }

    /// True when neither axis can move.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.max_x <= 0.0 && self.max_y <= 0.0
    }
}

#[inline]
fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[inline]
fn clamp_axis(value: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, non_negative(max))
}
