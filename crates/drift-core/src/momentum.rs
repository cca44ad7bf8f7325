#![forbid(unsafe_code)]

//! Inertial coasting after a drag is released.
//!
//! Each frame tick the velocity decays by a constant friction factor and the
//! offset advances by `velocity × tick_ms` through the clamped setter:
//!
//! ```text
//! v_{k+1} = v_k · friction
//! stop when |v_{k+1}| < stop_speed
//! ```
//!
//! Because `friction < 1` the speed is strictly decreasing and the number of
//! ticks is bounded by [`tick_budget`]. An axis that runs into its bound loses
//! its velocity component; when both components are gone the coast ends early.

use serde::{Deserialize, Serialize};

use crate::geometry::{PanBounds, PanOffset};
use crate::velocity::Velocity;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning for release-velocity estimation and momentum decay.
///
/// All speeds are px/ms, all durations milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    /// Per-tick velocity multiplier (default: 0.955). Must lie in `(0, 1)`.
    pub friction: f64,
    /// Speed below which coasting stops and velocity clears (default: 0.005).
    pub stop_speed: f64,
    /// Release speed required to start coasting at all (default: 0.05).
    pub min_release_speed: f64,
    /// Release speeds above this are scaled down (default: 8.0).
    pub max_release_speed: f64,
    /// Simulated frame duration (default: 1000/60).
    pub tick_ms: f64,
    /// Weight of each new velocity sample in the moving average (default: 0.3).
    pub smoothing: f64,
    /// Floor for the time between two move samples (default: 16).
    pub min_sample_interval_ms: f64,
    /// A pointer resting longer than this before release throws nothing (default: 100).
    pub stale_velocity_ms: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            friction: 0.955,
            stop_speed: 0.005,
            min_release_speed: 0.05,
            max_release_speed: 8.0,
            tick_ms: 1000.0 / 60.0,
            smoothing: 0.3,
            min_sample_interval_ms: 16.0,
            stale_velocity_ms: 100.0,
        }
    }
}

impl MomentumConfig {
    /// Set the per-tick friction factor.
    #[must_use]
    pub fn friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    /// Set the stop threshold.
    #[must_use]
    pub fn stop_speed(mut self, speed: f64) -> Self {
        self.stop_speed = speed;
        self
    }

    /// Set the minimum release speed.
    #[must_use]
    pub fn min_release_speed(mut self, speed: f64) -> Self {
        self.min_release_speed = speed;
        self
    }

    /// Set the stale-velocity window.
    #[must_use]
    pub fn stale_velocity_ms(mut self, ms: f64) -> Self {
        self.stale_velocity_ms = ms;
        self
    }

    /// Human-readable problems with this configuration; empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.friction > 0.0 && self.friction < 1.0) {
            errors.push(format!("friction must be in (0, 1), got {}", self.friction));
        }
        if !(self.stop_speed.is_finite() && self.stop_speed > 0.0) {
            errors.push(format!("stop_speed must be > 0, got {}", self.stop_speed));
        }
        if !(self.min_release_speed.is_finite() && self.min_release_speed >= 0.0) {
            errors.push(format!(
                "min_release_speed must be >= 0, got {}",
                self.min_release_speed
            ));
        }
        if !(self.max_release_speed.is_finite() && self.max_release_speed > 0.0) {
            errors.push(format!(
                "max_release_speed must be > 0, got {}",
                self.max_release_speed
            ));
        }
        if !(self.tick_ms.is_finite() && self.tick_ms > 0.0) {
            errors.push(format!("tick_ms must be > 0, got {}", self.tick_ms));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            errors.push(format!("smoothing must be in [0, 1], got {}", self.smoothing));
        }
        if !(self.min_sample_interval_ms.is_finite() && self.min_sample_interval_ms > 0.0) {
            errors.push(format!(
                "min_sample_interval_ms must be > 0, got {}",
                self.min_sample_interval_ms
            ));
        }
        if !(self.stale_velocity_ms >= 0.0) {
            errors.push(format!(
                "stale_velocity_ms must be >= 0, got {}",
                self.stale_velocity_ms
            ));
        }
        errors
    }
}

/// Upper bound on the number of ticks a coast starting at `initial_speed`
/// can run before it settles.
#[must_use]
pub fn tick_budget(initial_speed: f64, config: &MomentumConfig) -> u32 {
    if !(initial_speed > config.stop_speed) || !(config.friction > 0.0 && config.friction < 1.0) {
        return 1;
    }
    let ticks = (config.stop_speed / initial_speed).ln() / config.friction.ln();
    // Saturating float-to-int cast.
    (ticks.ceil() as u32).saturating_add(1)
}

// ---------------------------------------------------------------------------
// Momentum
// ---------------------------------------------------------------------------

/// One coast in progress. Velocity is in offset space.
#[derive(Debug, Clone, PartialEq)]
pub struct Momentum {
    velocity: Velocity,
    ticks: u32,
}

impl Momentum {
    /// Start coasting with `velocity`, or `None` when it is too slow to throw.
    #[must_use]
    pub fn start(velocity: Velocity, config: &MomentumConfig) -> Option<Self> {
        let speed = velocity.speed();
        if !speed.is_finite() || speed <= config.min_release_speed || speed < config.stop_speed {
            return None;
        }
        Some(Self {
            velocity: velocity.limited(config.max_release_speed),
            ticks: 0,
        })
    }

    #[inline]
    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Ticks that moved the offset so far.
    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Advance one frame. Returns `true` while the coast keeps running.
    ///
    /// When this returns `false` the velocity has been cleared to zero.
    pub fn tick(
        &mut self,
        offset: &mut PanOffset,
        bounds: &PanBounds,
        config: &MomentumConfig,
    ) -> bool {
        self.velocity = self.velocity.scaled(config.friction);

        if self.velocity.speed() < config.stop_speed {
            self.velocity = Velocity::ZERO;
            return false;
        }

        let target = PanOffset::new(
            offset.x + self.velocity.vx * config.tick_ms,
            offset.y + self.velocity.vy * config.tick_ms,
        );
        let clamped = bounds.clamp(target);
        if clamped.x != target.x {
            self.velocity.vx = 0.0;
        }
        if clamped.y != target.y {
            self.velocity.vy = 0.0;
        }
        *offset = clamped;
        self.ticks += 1;

        if self.velocity.is_zero() {
            return false;
        }
        true
    }
}
