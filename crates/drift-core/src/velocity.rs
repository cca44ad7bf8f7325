#![forbid(unsafe_code)]

//! Release-velocity estimation for pointer drags.
//!
//! Every move sample yields an instantaneous velocity (positional delta over
//! elapsed time, with the elapsed time floored so back-to-back samples cannot
//! explode it). The estimate is an exponential moving average:
//!
//! ```text
//! v' = v · (1 − α) + v_inst · α        α = smoothing (default 0.3)
//! ```
//!
//! Velocities are in pixels per millisecond and expressed in pointer space;
//! the pan controller negates them into offset space.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// A 2-D velocity in px/ms.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
}

impl Velocity {
    pub const ZERO: Self = Self { vx: 0.0, vy: 0.0 };

    #[inline]
    pub const fn new(vx: f64, vy: f64) -> Self {
        Self { vx, vy }
    }

    /// Euclidean speed.
    #[inline]
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }

    #[inline]
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.vx * factor, self.vy * factor)
    }

    #[inline]
    #[must_use]
    pub fn negated(self) -> Self {
        Self::new(-self.vx, -self.vy)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.vx == 0.0 && self.vy == 0.0
    }

    /// Scale down (preserving direction) so the speed does not exceed `max`.
    #[must_use]
    pub fn limited(self, max: f64) -> Self {
        let speed = self.speed();
        if speed > max && speed > 0.0 {
            self.scaled(max / speed)
        } else {
            self
        }
    }
}

/// Exponentially smoothed velocity tracker for one drag session.
#[derive(Debug, Clone)]
pub struct VelocityEstimator {
    smoothing: f64,
    min_interval_ms: f64,
    last: Option<(Point, Duration)>,
    velocity: Velocity,
}

impl VelocityEstimator {
    /// Create an estimator. `smoothing` is the weight of each new sample and
    /// is clamped to `0..=1`; `min_interval_ms` floors the elapsed time.
    #[must_use]
    pub fn new(smoothing: f64, min_interval_ms: f64) -> Self {
        Self {
            smoothing: if smoothing.is_finite() {
                smoothing.clamp(0.0, 1.0)
            } else {
                1.0
            },
            min_interval_ms: min_interval_ms.max(f64::EPSILON),
            last: None,
            velocity: Velocity::ZERO,
        }
    }

    /// Forget all history and anchor at `position`.
    pub fn reset(&mut self, position: Point, now: Duration) {
        self.last = Some((position, now));
        self.velocity = Velocity::ZERO;
    }

    /// Fold one move sample into the estimate and return it.
    pub fn sample(&mut self, position: Point, now: Duration) -> Velocity {
        if let Some((prev, prev_time)) = self.last {
            let elapsed_ms = millis(now.saturating_sub(prev_time)).max(self.min_interval_ms);
            let instant = Velocity::new(
                (position.x - prev.x) / elapsed_ms,
                (position.y - prev.y) / elapsed_ms,
            );
            let keep = 1.0 - self.smoothing;
            self.velocity = Velocity::new(
                self.velocity.vx * keep + instant.vx * self.smoothing,
                self.velocity.vy * keep + instant.vy * self.smoothing,
            );
        }
        self.last = Some((position, now));
        self.velocity
    }

    /// Current estimate.
    #[inline]
    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Velocity to hand to momentum on release at `now`.
    ///
    /// Returns zero when the pointer has rested for longer than
    /// `stale_after_ms` since the last sample.
    #[must_use]
    pub fn release(&self, now: Duration, stale_after_ms: f64) -> Velocity {
        match self.last {
            Some((_, at)) if millis(now.saturating_sub(at)) > stale_after_ms => Velocity::ZERO,
            _ => self.velocity,
        }
    }
}

#[inline]
fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
