#![forbid(unsafe_code)]

//! Viewer configuration as data.
//!
//! [`ViewerConfig`] gathers every tunable of the collage viewer so it can be
//! loaded from TOML or JSON instead of being compiled in.
//!
//! ```toml
//! # drift.toml
//! [layout]
//! strategy = "scatter"
//! overscan = 2.0
//!
//! [momentum]
//! friction = 0.94
//!
//! [lifecycle]
//! exit_delay_ms = 300
//! ```
//!
//! ```rust,ignore
//! let config = ViewerConfig::from_toml_file("drift.toml")?;
//! ```
//!
//! Every field defaults to the built-in value, so `ViewerConfig::default()`
//! behaves exactly like a viewer constructed without a config file and any
//! file only has to name what it changes.

#[cfg(feature = "config-files")]
use std::path::Path;

use drift_core::{MomentumConfig, PanConfig};
use drift_layout::LayoutConfig;
use serde::{Deserialize, Serialize};

#[cfg(feature = "config-files")]
use crate::error::ConfigError;

/// Open/close timing of the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Time from the visible commit until content is revealed (default: 400).
    pub entry_delay_ms: u64,
    /// Time from close until the view is torn down (default: 550).
    pub exit_delay_ms: u64,
    /// Jump to the middle of the travel range when a subject's first layout
    /// appears (default: true).
    pub center_on_first_layout: bool,
    /// Ask the host to lock page scrolling while open (default: true).
    pub lock_page_scroll: bool,
    /// Close on the escape key (default: true).
    pub escape_closes: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            entry_delay_ms: 400,
            exit_delay_ms: 550,
            center_on_first_layout: true,
            lock_page_scroll: true,
            escape_closes: true,
        }
    }
}

impl LifecycleConfig {
    /// Set the reveal delay.
    #[must_use]
    pub fn entry_delay_ms(mut self, ms: u64) -> Self {
        self.entry_delay_ms = ms;
        self
    }

    /// Set the teardown delay.
    #[must_use]
    pub fn exit_delay_ms(mut self, ms: u64) -> Self {
        self.exit_delay_ms = ms;
        self
    }
}

/// Everything the viewer can be tuned with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub layout: LayoutConfig,
    pub pan: PanConfig,
    pub momentum: MomentumConfig,
    pub lifecycle: LifecycleConfig,
}

impl ViewerConfig {
    /// Load from a TOML string. Invalid values are rejected.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string. Invalid values are rejected.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.checked()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    #[cfg(feature = "config-files")]
    fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            tracing::warn!(target: "drift.viewer", problems = errors.len(), "config rejected");
            Err(ConfigError::Validation(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns one message per problem, prefixed with the section name. An
    /// empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors: Vec<String> = self
            .layout
            .validate()
            .into_iter()
            .map(|e| format!("layout: {e}"))
            .collect();
        errors.extend(
            self.momentum
                .validate()
                .into_iter()
                .map(|e| format!("momentum: {e}")),
        );
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_layout::LayoutStrategy;

    #[test]
    fn default_matches_component_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.layout, LayoutConfig::default());
        assert_eq!(config.momentum, MomentumConfig::default());
        assert_eq!(config.lifecycle.entry_delay_ms, 400);
        assert_eq!(config.lifecycle.exit_delay_ms, 550);
        assert!(config.lifecycle.center_on_first_layout);
    }

    #[test]
    fn default_validates_clean() {
        assert!(ViewerConfig::default().validate().is_empty());
    }

    #[test]
    fn partial_json_preserves_defaults() {
        let config: ViewerConfig = serde_json::from_str(
            r#"{"layout": {"strategy": "scatter"}, "lifecycle": {"exit_delay_ms": 10}}"#,
        )
        .expect("parse");
        assert_eq!(config.layout.strategy, LayoutStrategy::Scatter);
        assert_eq!(config.layout.gap_px, 16.0);
        assert_eq!(config.lifecycle.exit_delay_ms, 10);
        assert_eq!(config.lifecycle.entry_delay_ms, 400);
        assert_eq!(config.momentum.friction, 0.955);
    }

    #[test]
    fn multiple_validation_errors_collected() {
        let mut config = ViewerConfig::default();
        config.layout.overscan = 0.5;
        config.layout.max_items = 0;
        config.momentum.friction = 1.2;
        let errors = config.validate();
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors[0].starts_with("layout: "));
        assert!(errors[2].starts_with("momentum: "));
    }
}
