#![forbid(unsafe_code)]

//! Generation tokens for cancelling in-flight work.
//!
//! Every probe batch is tagged with the [`Generation`] current when it was
//! issued. Advancing the [`GenerationCounter`] invalidates every earlier
//! generation at once: completions carrying an old tag are discarded by
//! comparison, so nothing needs to reach into the loader to stop them.
//!
//! # Example
//!
//! ```
//! use drift_runtime::generation::GenerationCounter;
//!
//! let mut counter = GenerationCounter::new();
//! let first = counter.advance();
//! let second = counter.advance();
//! assert!(!counter.is_current(first));
//! assert!(counter.is_current(second));
//! ```

use serde::{Deserialize, Serialize};

/// Tag identifying one batch of asynchronous work.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Monotonic generation source. Generation 0 is never issued.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Generation,
}

impl GenerationCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently issued generation.
    #[inline]
    pub fn current(&self) -> Generation {
        self.current
    }

    /// Issue a new generation, cancelling all earlier ones.
    pub fn advance(&mut self) -> Generation {
        self.current = Generation(self.current.0.wrapping_add(1));
        self.current
    }

    /// Whether `generation` has not been superseded.
    #[inline]
    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.current
    }
}
