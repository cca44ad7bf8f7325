#![forbid(unsafe_code)]

//! Error types for drift-runtime.

use thiserror::Error;

/// Configuration could not be loaded or is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config-files")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config-files")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Why one image could not be measured.
///
/// Never fatal: the prober logs it and substitutes a square fallback metric.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("image {image_id} is unavailable: {message}")]
    Unavailable { image_id: String, message: String },

    #[error("image {image_id} could not be decoded: {message}")]
    Decode { image_id: String, message: String },

    #[error("image {image_id} reports zero size ({width}x{height})")]
    ZeroSize {
        image_id: String,
        width: u32,
        height: u32,
    },
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
