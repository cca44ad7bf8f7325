#![forbid(unsafe_code)]

//! Seeded free-form scatter layout.
//!
//! Tiles march left to right in steps of `max(min_step, viewport_w × fraction)`
//! with jitter, some are pulled toward a cluster point for density, and each
//! gets a centre-biased vertical position, a small rotation and a depth layer
//! (z-index 1–4) with a matching parallax factor.
//!
//! All randomness comes from one [`Mulberry32`] stream consumed in a fixed
//! order, so a given `(viewport, metrics, seed)` always produces the same
//! layout. The segment is exactly one viewport tall; tiles taller than
//! `max_height_fraction` of it are scaled down with their proportions kept.

use drift_core::geometry::Size;

use crate::config::{LayoutConfig, LayoutStrategy};
use crate::metrics::ImageMetrics;
use crate::{CollageLayout, LayoutItem};

/// Small, fast 32-bit PRNG producing floats in `[0, 1)`.
///
/// Bit-for-bit compatible with the common JavaScript `mulberry32` snippet, so
/// layouts can be reproduced on either side of a wasm boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next raw 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let t = self.state;
        let mut x = (t ^ (t >> 15)).wrapping_mul(1 | t);
        x ^= x.wrapping_add((x ^ (x >> 7)).wrapping_mul(61 | x));
        x ^ (x >> 14)
    }

    /// Next float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Fisher–Yates shuffle, walking from the back.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for j in (1..items.len()).rev() {
            // floor(r × (j + 1)) is always <= j since r < 1
            let k = ((self.next_f64() * (j + 1) as f64) as usize).min(j);
            items.swap(j, k);
        }
    }
}

/// Parallax factor for a depth layer.
fn parallax_for(z_index: u8) -> f64 {
    match z_index {
        1 => 0.25,
        2 => 0.12,
        3 => -0.08,
        _ => -0.18,
    }
}

/// Callers guarantee a measured viewport and a non-empty metrics list.
pub(crate) fn scatter(
    viewport: Size,
    metrics: &[ImageMetrics],
    config: &LayoutConfig,
    seed: u32,
) -> CollageLayout {
    let tuning = &config.scatter;
    let mut rng = Mulberry32::new(seed);

    let n = metrics.len();
    let cycles = tuning.min_cycles.max(tuning.target_items.div_ceil(n)).max(1);
    let mut order = Vec::with_capacity(cycles * n);
    for _ in 0..cycles {
        let mut pass: Vec<usize> = (0..n).collect();
        rng.shuffle(&mut pass);
        order.extend(pass);
    }
    order.truncate(config.max_items.max(1));

    let count = order.len();
    let step = tuning.min_step_px.max(viewport.width * tuning.step_fraction);
    let cluster_x = count as f64 * step * 0.4;
    let max_height = viewport.height * tuning.max_height_fraction.clamp(f64::EPSILON, 1.0);

    let mut items = Vec::with_capacity(count);
    let mut right_edge: f64 = 0.0;
    for (i, &source_index) in order.iter().enumerate() {
        let image = &metrics[source_index];
        let aspect = image.layout_aspect();

        let size_roll = rng.next_f64();
        let mut width = if size_roll < 0.25 {
            180.0 + rng.next_f64() * 120.0
        } else if size_roll < 0.6 {
            300.0 + rng.next_f64() * 180.0
        } else {
            420.0 + rng.next_f64() * 200.0
        };
        let mut height = width * aspect;
        if height > max_height {
            height = max_height;
            width = height / aspect;
        }

        let mut left = i as f64 * step + (rng.next_f64() - 0.3) * (step * 0.7);
        if rng.next_f64() < 0.35 {
            let pull = 0.3 + rng.next_f64() * 0.4;
            left += (cluster_x - left) * pull;
        }
        let left = left.max(0.0);

        let free = viewport.height - height;
        let center_y = free / 2.0;
        let spread = free * 0.35;
        let bias = (rng.next_f64() + rng.next_f64() + rng.next_f64()) / 3.0;
        let top = (center_y + (bias - 0.5) * spread * 2.0).clamp(0.0, free.max(0.0));

        let rotation_deg = (rng.next_f64() * 2.0 - 1.0) * 1.8;
        // next_f64() < 1, so this stays within 1..=4
        let z_index = 1 + (rng.next_f64() * 4.0) as u8;

        right_edge = right_edge.max(left + width);
        items.push(LayoutItem {
            image_id: image.id.clone(),
            source_index,
            left_px: left,
            top_px: top,
            width_px: width,
            height_px: height,
            z_index,
            column: None,
            rotation_deg,
            parallax: parallax_for(z_index),
            reveal_delay_ms: config.reveal.delay_for(i),
        });
    }

    CollageLayout {
        strategy: LayoutStrategy::Scatter,
        segment_width_px: viewport.width.max(right_edge + step),
        segment_height_px: viewport.height,
        viewport_w: viewport.width,
        viewport_h: viewport.height,
        columns: 0,
        column_width_px: 0.0,
        items,
    }
}
