#![forbid(unsafe_code)]

//! Filesystem image loader.
//!
//! Reads only the image header through [`image::image_dimensions`], so
//! probing a directory of large photos stays cheap. Loads complete
//! synchronously into a queue; the caller feeds them back to the viewer or
//! prober with [`FsImageLoader::drain_completions`].

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::ImageError;

use crate::error::ProbeError;
use crate::generation::Generation;
use crate::prober::{ImageLoader, LoadRequest, ProbeCompletion};

/// Resolves image ids as paths relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsImageLoader {
    root: PathBuf,
    completions: VecDeque<ProbeCompletion>,
}

impl FsImageLoader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            completions: VecDeque::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Take every completion produced so far, in load order.
    pub fn drain_completions(&mut self) -> Vec<ProbeCompletion> {
        self.completions.drain(..).collect()
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&mut self, request: LoadRequest) {
        let path = self.root.join(&request.image_id);
        let outcome = image::image_dimensions(&path).map_err(|err| match err {
            ImageError::IoError(io) => ProbeError::Unavailable {
                image_id: request.image_id.clone(),
                message: io.to_string(),
            },
            other => ProbeError::Decode {
                image_id: request.image_id.clone(),
                message: other.to_string(),
            },
        });
        tracing::trace!(
            target: "drift.probe",
            path = %path.display(),
            ok = outcome.is_ok(),
            "image header read"
        );
        self.completions.push_back(ProbeCompletion {
            generation: request.generation,
            slot: request.slot,
            outcome,
        });
    }

    fn abort(&mut self, generation: Generation) {
        self.completions.retain(|c| c.generation != generation);
    }
}
