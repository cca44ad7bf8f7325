#![forbid(unsafe_code)]

//! Collage layout for drift.
//!
//! Turns a viewport size and a list of [`ImageMetrics`] into absolutely
//! positioned tiles covering an oversized segment the viewer can pan across.
//!
//! # Role in drift
//! `drift-layout` is pure: no I/O, no clocks, no shared state. The runtime
//! calls [`compute_layout`] whenever the viewport is (re)measured or a probe
//! batch completes, and derives pan bounds from the result with
//! [`CollageLayout::pan_bounds`].
//!
//! # Strategies
//! - [`LayoutStrategy::Masonry`] (default): equal-width columns filled
//!   shortest-first. See [`masonry`].
//! - [`LayoutStrategy::Scatter`]: seeded free-form placement. See [`scatter`].
//!
//! # Example
//! ```
//! use drift_core::geometry::Size;
//! use drift_layout::{ImageMetrics, LayoutConfig, compute_layout};
//!
//! let metrics = vec![
//!     ImageMetrics::new("harbour.jpg", 1600, 1067),
//!     ImageMetrics::new("tower.jpg", 1000, 1500),
//! ];
//! let layout = compute_layout(Size::new(1200.0, 800.0), &metrics, &LayoutConfig::default(), 0)
//!     .expect("measured viewport");
//! assert!(layout.segment_width_px >= 1200.0);
//! assert_eq!(layout.columns, 5);
//! ```

pub mod config;
pub mod masonry;
pub mod metrics;
pub mod scatter;

use drift_core::geometry::{PanBounds, Size};
use serde::{Deserialize, Serialize};

pub use config::{ColumnRule, LayoutConfig, LayoutStrategy, RevealStagger, ScatterConfig};
pub use masonry::ShortestColumnPacker;
pub use metrics::ImageMetrics;
pub use scatter::Mulberry32;

/// One positioned tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub image_id: String,
    /// Index of the image in the metrics list this tile repeats.
    pub source_index: usize,
    pub left_px: f64,
    pub top_px: f64,
    pub width_px: f64,
    pub height_px: f64,
    /// Stacking order; masonry tiles all sit on layer 1.
    pub z_index: u8,
    /// Masonry column, `None` for scatter tiles.
    pub column: Option<usize>,
    pub rotation_deg: f64,
    pub parallax: f64,
    /// Entrance transition delay.
    pub reveal_delay_ms: u32,
}

impl LayoutItem {
    #[inline]
    pub fn right_px(&self) -> f64 {
        self.left_px + self.width_px
    }

    #[inline]
    pub fn bottom_px(&self) -> f64 {
        self.top_px + self.height_px
    }
}

/// A complete layout snapshot. Read-only to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollageLayout {
    pub strategy: LayoutStrategy,
    pub segment_width_px: f64,
    pub segment_height_px: f64,
    pub viewport_w: f64,
    pub viewport_h: f64,
    /// Column count (0 for scatter).
    pub columns: usize,
    /// Column width (0 for scatter).
    pub column_width_px: f64,
    pub items: Vec<LayoutItem>,
}

impl CollageLayout {
    #[inline]
    pub fn segment_size(&self) -> Size {
        Size::new(self.segment_width_px, self.segment_height_px)
    }

    #[inline]
    pub fn viewport(&self) -> Size {
        Size::new(self.viewport_w, self.viewport_h)
    }

    /// Pan travel range for this layout.
    #[must_use]
    pub fn pan_bounds(&self) -> PanBounds {
        PanBounds::for_content(self.segment_size(), self.viewport())
    }

    /// Tiles of one masonry column in placement order.
    pub fn column_items(&self, column: usize) -> impl Iterator<Item = &LayoutItem> {
        self.items
            .iter()
            .filter(move |item| item.column == Some(column))
    }
}

/// Compute the collage for `viewport`.
///
/// Returns `None` when the viewport is not measured yet or there are no
/// images; callers retry on the next size notification or probe completion.
/// `seed` only affects [`LayoutStrategy::Scatter`] when no fixed seed is
/// configured.
#[must_use]
pub fn compute_layout(
    viewport: Size,
    metrics: &[ImageMetrics],
    config: &LayoutConfig,
    seed: u32,
) -> Option<CollageLayout> {
    if !viewport.is_measured() {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "drift.layout",
            width = viewport.width,
            height = viewport.height,
            "layout deferred: viewport not measured"
        );
        return None;
    }
    if metrics.is_empty() {
        return None;
    }

    let layout = match config.strategy {
        LayoutStrategy::Masonry => masonry::pack(viewport, metrics, config),
        LayoutStrategy::Scatter => {
            scatter::scatter(viewport, metrics, config, config.scatter.seed.unwrap_or(seed))
        }
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(
        target: "drift.layout",
        strategy = ?layout.strategy,
        items = layout.items.len(),
        segment_width = layout.segment_width_px,
        segment_height = layout.segment_height_px,
        "layout computed"
    );

    Some(layout)
}

/// Stable 32-bit seed for a subject identifier (FNV-1a).
///
/// Used when [`ScatterConfig::seed`] is unset. Set that field to reproduce a
/// collage built from a known seed.
#[must_use]
pub fn subject_seed(subject_id: &str) -> u32 {
    const OFFSET_BASIS: u32 = 0x811C_9DC5;
    const PRIME: u32 = 0x0100_0193;
    subject_id.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(PRIME)
    })
}
