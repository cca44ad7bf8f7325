#![forbid(unsafe_code)]

//! Intrinsic image measurements.

use serde::{Deserialize, Serialize};

/// Intrinsic size of one source image.
///
/// `aspect` is `height / width` and is always finite and positive: images
/// that failed to load or reported a zero dimension carry the square
/// fallback (`1 × 1`, aspect 1) so they still occupy a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetrics {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub aspect: f64,
}

impl ImageMetrics {
    /// Metrics from a decoded image size. Zero dimensions yield the fallback.
    #[must_use]
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return Self::fallback(id);
        }
        Self {
            id: id.into(),
            width,
            height,
            aspect: f64::from(height) / f64::from(width),
        }
    }

    /// Square placeholder metrics for an image that could not be measured.
    #[must_use]
    pub fn fallback(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            width: 1,
            height: 1,
            aspect: 1.0,
        }
    }

    /// Aspect usable for layout; repairs values deserialized from elsewhere.
    #[inline]
    pub fn layout_aspect(&self) -> f64 {
        if self.aspect.is_finite() && self.aspect > 0.0 {
            self.aspect
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_is_height_over_width() {
        let m = ImageMetrics::new("tall.jpg", 800, 1200);
        assert_eq!(m.aspect, 1.5);
    }

    #[test]
    fn zero_dimension_falls_back() {
        let m = ImageMetrics::new("broken.png", 0, 300);
        assert_eq!(m, ImageMetrics::fallback("broken.png"));
        assert_eq!(m.aspect, 1.0);
    }

    #[test]
    fn layout_aspect_repairs_garbage() {
        let mut m = ImageMetrics::new("a", 10, 10);
        m.aspect = f64::NAN;
        assert_eq!(m.layout_aspect(), 1.0);
        m.aspect = -2.0;
        assert_eq!(m.layout_aspect(), 1.0);
    }
}
