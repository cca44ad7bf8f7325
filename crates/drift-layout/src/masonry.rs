#![forbid(unsafe_code)]

//! Shortest-column-first masonry packing.
//!
//! # Algorithm
//!
//! ```text
//! content   = viewport × overscan
//! col_w     = (content_w − 2·padding − (cols − 1)·gap) / cols
//! for each index in the repeated source sequence:
//!     c      = argmin(running_height)        ties → lowest index
//!     top    = padding + running_height[c]
//!     h      = col_w × aspect
//!     running_height[c] += h + gap
//! segment_h = max(content_h, tallest column bottom + padding)
//! ```
//!
//! The source set repeats in full passes until every column holds at least
//! `min_rows_per_column` tiles on average and the shortest column reaches
//! the content height, or until `max_items` tiles exist.
//!
//! # Invariants
//!
//! 1. Tiles within one column never overlap vertically; consecutive tiles are
//!    separated by exactly `gap`.
//! 2. The chosen column is always the one with the smallest running height.
//! 3. `segment_w ≥ viewport_w` and `segment_h ≥ viewport_h`.
//! 4. Output depends only on the inputs; no hashing, clocks or randomness.

use drift_core::geometry::Size;

use crate::config::{LayoutConfig, LayoutStrategy};
use crate::metrics::ImageMetrics;
use crate::{CollageLayout, LayoutItem};

/// Narrowest column the packer will produce, whatever the padding.
const MIN_COLUMN_WIDTH_PX: f64 = 1.0;

/// Running column heights with shortest-first selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestColumnPacker {
    heights: Vec<f64>,
    gap: f64,
}

impl ShortestColumnPacker {
    /// `columns` empty columns (at least one) separated vertically by `gap`.
    #[must_use]
    pub fn new(columns: usize, gap: f64) -> Self {
        Self {
            heights: vec![0.0; columns.max(1)],
            gap,
        }
    }

    /// Column with the smallest running height; ties go to the lowest index.
    #[must_use]
    pub fn shortest(&self) -> usize {
        let mut best = 0;
        for (index, height) in self.heights.iter().enumerate().skip(1) {
            if *height < self.heights[best] {
                best = index;
            }
        }
        best
    }

    /// Place a tile of `height` and return `(column, top)` relative to the
    /// content origin.
    pub fn place(&mut self, height: f64) -> (usize, f64) {
        let column = self.shortest();
        let top = self.heights[column];
        self.heights[column] += height + self.gap;
        (column, top)
    }

    /// Running height of every column (includes one trailing gap per
    /// non-empty column).
    #[inline]
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Smallest running height.
    pub fn min_height(&self) -> f64 {
        self.heights[self.shortest()]
    }

    /// Bottom edge of the tallest column, trailing gap excluded.
    pub fn tallest_bottom(&self) -> f64 {
        self.heights
            .iter()
            .map(|h| if *h > 0.0 { h - self.gap } else { 0.0 })
            .fold(0.0, f64::max)
    }
}

/// Pack `metrics` into columns for `viewport`.
///
/// Callers guarantee a measured viewport and a non-empty metrics list.
pub(crate) fn pack(
    viewport: Size,
    metrics: &[ImageMetrics],
    config: &LayoutConfig,
) -> CollageLayout {
    let overscan = config.effective_overscan();
    let padding = config.padding_px.max(0.0);
    let gap = config.gap_px.max(0.0);
    let columns = config.columns.columns_for(viewport.width);

    let target_w = viewport.width * overscan;
    let target_h = viewport.height * overscan;
    let gutters = gap * (columns - 1) as f64;
    let fitted = (target_w - 2.0 * padding - gutters) / columns as f64;
    let (column_width, segment_width) = if fitted >= MIN_COLUMN_WIDTH_PX {
        (fitted, target_w)
    } else {
        let packed_w = 2.0 * padding + gutters + MIN_COLUMN_WIDTH_PX * columns as f64;
        (MIN_COLUMN_WIDTH_PX, target_w.max(packed_w))
    };

    let min_items = columns.saturating_mul(config.min_rows_per_column);
    let max_items = config.max_items.max(1);
    let mut packer = ShortestColumnPacker::new(columns, gap);
    let mut items = Vec::new();

    'passes: loop {
        for (source_index, image) in metrics.iter().enumerate() {
            if items.len() >= max_items {
                break 'passes;
            }
            let height = column_width * image.layout_aspect();
            let (column, top) = packer.place(height);
            let index = items.len();
            items.push(LayoutItem {
                image_id: image.id.clone(),
                source_index,
                left_px: padding + column as f64 * (column_width + gap),
                top_px: padding + top,
                width_px: column_width,
                height_px: height,
                z_index: 1,
                column: Some(column),
                rotation_deg: 0.0,
                parallax: 0.0,
                reveal_delay_ms: config.reveal.delay_for(index),
            });
        }
        let covered = padding + packer.min_height() >= target_h;
        if items.len() >= max_items || (items.len() >= min_items && covered) {
            break;
        }
    }

    let segment_height = target_h.max(padding + packer.tallest_bottom() + padding);

    CollageLayout {
        strategy: LayoutStrategy::Masonry,
        segment_width_px: segment_width,
        segment_height_px: segment_height,
        viewport_w: viewport.width,
        viewport_h: viewport.height,
        columns,
        column_width_px: column_width,
        items,
    }
}
