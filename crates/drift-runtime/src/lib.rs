#![forbid(unsafe_code)]

//! Runtime for the drift collage viewer.
//!
//! Ties the pure pieces together: [`MetricsProber`] measures images through
//! a host [`ImageLoader`], [`CollageViewer`] runs the open/close lifecycle,
//! recomputes the layout when inputs change and routes pointer input to the
//! pan controller. Everything is single-threaded and driven by host calls
//! plus frame callbacks from a [`FrameScheduler`](drift_core::FrameScheduler).
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use drift_core::ManualFrameScheduler;
//! use drift_runtime::{CollageViewer, ProbeCompletion, QueuedImageLoader, ViewPhase, ViewerConfig};
//!
//! let mut viewer = CollageViewer::new(
//!     ViewerConfig::default(),
//!     ManualFrameScheduler::new(),
//!     QueuedImageLoader::new(),
//! )?;
//! viewer.resize(1280.0, 800.0);
//! viewer.open("lisbon", vec!["tram.jpg".into()]);
//!
//! for request in viewer.loader_mut().drain_requests() {
//!     viewer.on_image_loaded(ProbeCompletion::loaded(&request, 1600, 1067));
//! }
//!
//! let mut now = Duration::ZERO;
//! while let Some(token) = viewer.pending_frame() {
//!     viewer.scheduler_mut().take_pending();
//!     viewer.on_frame(token, now);
//!     now += Duration::from_millis(16);
//! }
//! assert_eq!(viewer.phase(), ViewPhase::ContentVisible);
//! assert!(viewer.layout().is_some());
//! # Ok::<(), drift_runtime::ConfigError>(())
//! ```

pub mod config;
pub mod error;
#[cfg(feature = "fs-probe")]
pub mod fs_probe;
pub mod generation;
pub mod prober;
pub mod viewer;

pub use config::{LifecycleConfig, ViewerConfig};
pub use error::{ConfigError, ProbeError, Result};
#[cfg(feature = "fs-probe")]
pub use fs_probe::FsImageLoader;
pub use generation::{Generation, GenerationCounter};
pub use prober::{
    ImageLoader, LoadRequest, MetricsProber, ProbeCompletion, ProbeProgress, QueuedImageLoader,
};
pub use viewer::{CollageViewer, HostCommand, Subject, ViewFlags, ViewPhase, ViewerSnapshot};
