#![forbid(unsafe_code)]

//! Core: geometry, pointer vocabulary and inertial panning for drift.
//!
//! # Role in drift
//! `drift-core` is the input layer. It owns the pan offset, the drag session
//! that writes it, the velocity estimate taken from pointer samples and the
//! momentum coast that continues after release. It is free of any notion of
//! images or lifecycle; the runtime (`drift-runtime`) feeds it bounds derived
//! from the current layout and host pointer events.
//!
//! # Primary responsibilities
//! - **PanController**: one pointer session at a time, clamped offset.
//! - **Momentum**: friction decay with a bounded number of ticks.
//! - **VelocityEstimator**: exponentially smoothed release velocity.
//! - **FrameScheduler**: cancellable next-frame callbacks.

pub mod event;
pub mod frame;
pub mod geometry;
pub mod momentum;
pub mod pan;
pub mod velocity;

pub use event::{KeyCode, PointerButton, PointerId};
pub use frame::{FrameScheduler, FrameToken, ManualFrameScheduler};
pub use geometry::{PanBounds, PanOffset, Point, Size};
pub use momentum::{Momentum, MomentumConfig, tick_budget};
pub use pan::{
    PanCaptureCommand, PanConfig, PanController, PanDispatch, PanIgnoredReason,
    PanLifecyclePhase, PanLogEntry, PanMotion, PanOutcome,
};
pub use velocity::{Velocity, VelocityEstimator};
