#![forbid(unsafe_code)]

//! Layout tuning.
//!
//! Every field defaults to the built-in constant, so `LayoutConfig::default()`
//! is the stock collage. Configs deserialize with `#[serde(default)]`, which
//! lets a file override a single knob.

use serde::{Deserialize, Serialize};

/// Which packer produces the collage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStrategy {
    /// Shortest-column-first columns of equal width.
    #[default]
    Masonry,
    /// Seeded free-form scatter with rotation and parallax hints.
    Scatter,
}

/// Viewport-width to column-count rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRule {
    /// Viewports narrower than this use `narrow` columns (default: 768).
    pub narrow_below_px: f64,
    /// Column count on narrow viewports (default: 3).
    pub narrow: usize,
    /// Column count otherwise (default: 5).
    pub wide: usize,
}

impl Default for ColumnRule {
    fn default() -> Self {
        Self {
            narrow_below_px: 768.0,
            narrow: 3,
            wide: 5,
        }
    }
}

impl ColumnRule {
    /// Column count for a viewport of `width` pixels. Never zero.
    #[must_use]
    pub fn columns_for(&self, width: f64) -> usize {
        let columns = if width < self.narrow_below_px {
            self.narrow
        } else {
            self.wide
        };
        columns.max(1)
    }
}

/// Knobs of the scatter strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    /// Fixed generator seed; `None` derives it from the subject id with
    /// [`subject_seed`](crate::subject_seed).
    ///
    /// The derived seed is an FNV-1a hash, so it will not match collages
    /// generated elsewhere with hand-picked per-subject seeds. Pin the seed to
    /// reproduce such a collage exactly:
    ///
    /// ```
    /// use drift_core::Size;
    /// use drift_layout::{ImageMetrics, LayoutConfig, LayoutStrategy, compute_layout};
    ///
    /// // Seed used for the San Francisco collage.
    /// let config = LayoutConfig::default()
    ///     .strategy(LayoutStrategy::Scatter)
    ///     .scatter_seed(0x51f0c0);
    /// let metrics = vec![ImageMetrics::new("bridge.jpg", 1600, 1067)];
    /// let viewport = Size::new(1280.0, 800.0);
    ///
    /// // The subject seed argument is ignored once a seed is pinned.
    /// let a = compute_layout(viewport, &metrics, &config, 1);
    /// let b = compute_layout(viewport, &metrics, &config, 2);
    /// assert_eq!(a, b);
    /// ```
    pub seed: Option<u32>,
    /// Minimum number of shuffled passes over the source set (default: 4).
    pub min_cycles: usize,
    /// Passes are added until at least this many tiles exist (default: 24).
    pub target_items: usize,
    /// Lower bound of the horizontal step between tiles (default: 240).
    pub min_step_px: f64,
    /// Horizontal step as a fraction of viewport width (default: 0.2).
    pub step_fraction: f64,
    /// Tallest tile as a fraction of viewport height (default: 0.92).
    pub max_height_fraction: f64,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            seed: None,
            min_cycles: 4,
            target_items: 24,
            min_step_px: 240.0,
            step_fraction: 0.2,
            max_height_fraction: 0.92,
        }
    }
}

/// Entrance stagger for tiles: `(index % group) × step + base` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealStagger {
    /// Delay of the first tile in a group (default: 350).
    pub base_ms: u32,
    /// Extra delay per tile within a group (default: 40).
    pub step_ms: u32,
    /// Tiles per group before the delay wraps (default: 10).
    pub group: u32,
}

impl Default for RevealStagger {
    fn default() -> Self {
        Self {
            base_ms: 350,
            step_ms: 40,
            group: 10,
        }
    }
}

impl RevealStagger {
    /// Delay for the tile at `index`.
    #[must_use]
    pub fn delay_for(&self, index: usize) -> u32 {
        let group = self.group.max(1) as usize;
        let slot = u32::try_from(index % group).unwrap_or(0);
        self.base_ms.saturating_add(slot.saturating_mul(self.step_ms))
    }
}

/// Complete layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub strategy: LayoutStrategy,
    /// Content size relative to the viewport (default: 1.8). Values below 1
    /// are treated as 1.
    pub overscan: f64,
    /// Outer padding around the masonry content (default: 24).
    pub padding_px: f64,
    /// Gap between masonry tiles, both axes (default: 16).
    pub gap_px: f64,
    pub columns: ColumnRule,
    /// Tiles per column before the height target is considered (default: 4).
    pub min_rows_per_column: usize,
    /// Hard cap on generated tiles (default: 400).
    pub max_items: usize,
    pub scatter: ScatterConfig,
    pub reveal: RevealStagger,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            strategy: LayoutStrategy::Masonry,
            overscan: 1.8,
            padding_px: 24.0,
            gap_px: 16.0,
            columns: ColumnRule::default(),
            min_rows_per_column: 4,
            max_items: 400,
            scatter: ScatterConfig::default(),
            reveal: RevealStagger::default(),
        }
    }
}

impl LayoutConfig {
    /// Set the packing strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: LayoutStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the overscan factor.
    #[must_use]
    pub fn overscan(mut self, overscan: f64) -> Self {
        self.overscan = overscan;
        self
    }

    /// Set the fixed scatter seed.
    #[must_use]
    pub fn scatter_seed(mut self, seed: u32) -> Self {
        self.scatter.seed = Some(seed);
        self
    }

    /// Set the tile cap.
    #[must_use]
    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Effective overscan factor (at least 1).
    #[inline]
    pub(crate) fn effective_overscan(&self) -> f64 {
        if self.overscan.is_finite() && self.overscan > 1.0 {
            self.overscan
        } else {
            1.0
        }
    }

    /// Human-readable problems with this configuration; empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.overscan.is_finite() && self.overscan >= 1.0) {
            errors.push(format!("overscan must be >= 1, got {}", self.overscan));
        }
        if !(self.padding_px.is_finite() && self.padding_px >= 0.0) {
            errors.push(format!("padding_px must be >= 0, got {}", self.padding_px));
        }
        if !(self.gap_px.is_finite() && self.gap_px >= 0.0) {
            errors.push(format!("gap_px must be >= 0, got {}", self.gap_px));
        }
        if self.columns.narrow == 0 || self.columns.wide == 0 {
            errors.push("column counts must be >= 1".to_owned());
        }
        if self.max_items == 0 {
            errors.push("max_items must be >= 1".to_owned());
        }
        if !(self.scatter.min_step_px.is_finite() && self.scatter.min_step_px > 0.0) {
            errors.push(format!(
                "scatter.min_step_px must be > 0, got {}",
                self.scatter.min_step_px
            ));
        }
        if !(self.scatter.max_height_fraction > 0.0 && self.scatter.max_height_fraction <= 1.0) {
            errors.push(format!(
                "scatter.max_height_fraction must be in (0, 1], got {}",
                self.scatter.max_height_fraction
            ));
        }
        errors
    }
}
