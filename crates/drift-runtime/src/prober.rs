#![forbid(unsafe_code)]

//! Image metrics probing.
//!
//! [`MetricsProber`] turns a list of image ids into [`ImageMetrics`] by
//! issuing one [`LoadRequest`] per image through an [`ImageLoader`] and
//! collecting the [`ProbeCompletion`]s as the host reports them, in any
//! order. The batch resolves once every slot is filled; results keep the
//! order of the requested ids.
//!
//! Each batch carries a [`Generation`]. Starting a new batch or cancelling
//! advances the generation, after which completions from earlier batches
//! are dropped as [`ProbeProgress::Stale`]. A failed or zero-sized load
//! never fails the batch: the slot gets [`ImageMetrics::fallback`] and a
//! warning is logged on `drift.probe`.

use drift_layout::ImageMetrics;
use serde::{Deserialize, Serialize};

use crate::error::ProbeError;
use crate::generation::{Generation, GenerationCounter};

// ---------------------------------------------------------------------------
// Loader seam
// ---------------------------------------------------------------------------

/// Request to measure one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    pub generation: Generation,
    /// Position of the image in the requested id list.
    pub slot: usize,
    pub image_id: String,
}

/// Result of one load, reported back by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCompletion {
    pub generation: Generation,
    pub slot: usize,
    /// Natural `(width, height)` in pixels, or why it is unknown.
    pub outcome: Result<(u32, u32), ProbeError>,
}

impl ProbeCompletion {
    /// Successful load answering `request`.
    #[must_use]
    pub fn loaded(request: &LoadRequest, width: u32, height: u32) -> Self {
        Self {
            generation: request.generation,
            slot: request.slot,
            outcome: Ok((width, height)),
        }
    }

    /// Failed load answering `request`.
    #[must_use]
    pub fn failed(request: &LoadRequest, message: impl Into<String>) -> Self {
        Self {
            generation: request.generation,
            slot: request.slot,
            outcome: Err(ProbeError::Unavailable {
                image_id: request.image_id.clone(),
                message: message.into(),
            }),
        }
    }
}

/// Host-side image loading.
///
/// `load` must not block; the host reports each result later through
/// [`MetricsProber::complete`].
pub trait ImageLoader {
    fn load(&mut self, request: LoadRequest);

    /// Hint that results for `generation` are no longer wanted.
    fn abort(&mut self, generation: Generation) {
        let _ = generation;
    }
}

impl<T: ImageLoader + ?Sized> ImageLoader for &mut T {
    fn load(&mut self, request: LoadRequest) {
        (**self).load(request);
    }

    fn abort(&mut self, generation: Generation) {
        (**self).abort(generation);
    }
}

impl<T: ImageLoader + ?Sized> ImageLoader for Box<T> {
    fn load(&mut self, request: LoadRequest) {
        (**self).load(request);
    }

    fn abort(&mut self, generation: Generation) {
        (**self).abort(generation);
    }
}

/// Loader that only records requests, for hosts that poll for work.
#[derive(Debug, Clone, Default)]
pub struct QueuedImageLoader {
    requests: Vec<LoadRequest>,
    aborted: Vec<Generation>,
}

impl QueuedImageLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests issued and not yet drained.
    pub fn pending(&self) -> &[LoadRequest] {
        &self.requests
    }

    /// Take all queued requests.
    pub fn drain_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Generations aborted so far, oldest first.
    pub fn aborted(&self) -> &[Generation] {
        &self.aborted
    }
}

impl ImageLoader for QueuedImageLoader {
    fn load(&mut self, request: LoadRequest) {
        self.requests.push(request);
    }

    fn abort(&mut self, generation: Generation) {
        self.requests.retain(|r| r.generation != generation);
        self.aborted.push(generation);
    }
}

// ---------------------------------------------------------------------------
// Prober
// ---------------------------------------------------------------------------

/// What a call into the prober achieved.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeProgress {
    /// The completion belongs to a cancelled or superseded batch.
    Stale,
    /// The slot is unknown or was already filled.
    Ignored,
    /// Still waiting on `remaining` images.
    Pending { remaining: usize },
    /// Every image is measured, in request order.
    Resolved(Vec<ImageMetrics>),
}

#[derive(Debug)]
struct Batch {
    generation: Generation,
    image_ids: Vec<String>,
    slots: Vec<Option<ImageMetrics>>,
    remaining: usize,
}

/// Collects image metrics for one batch at a time.
#[derive(Debug, Default)]
pub struct MetricsProber {
    generations: GenerationCounter,
    batch: Option<Batch>,
}

impl MetricsProber {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the latest batch (or of the last cancellation).
    pub fn current_generation(&self) -> Generation {
        self.generations.current()
    }

    /// Whether a batch is waiting on loads.
    pub fn is_pending(&self) -> bool {
        self.batch.is_some()
    }

    /// Images still outstanding in the current batch.
    pub fn remaining(&self) -> usize {
        self.batch.as_ref().map_or(0, |b| b.remaining)
    }

    /// Start probing `image_ids`, superseding any batch in flight.
    ///
    /// An empty list resolves immediately to no metrics.
    pub fn begin<L: ImageLoader + ?Sized>(
        &mut self,
        image_ids: &[String],
        loader: &mut L,
    ) -> ProbeProgress {
        self.cancel(loader);
        let generation = self.generations.advance();

        if image_ids.is_empty() {
            tracing::debug!(target: "drift.probe", %generation, "empty probe batch");
            return ProbeProgress::Resolved(Vec::new());
        }

        tracing::debug!(
            target: "drift.probe",
            %generation,
            images = image_ids.len(),
            "probe started"
        );
        for (slot, image_id) in image_ids.iter().enumerate() {
            loader.load(LoadRequest {
                generation,
                slot,
                image_id: image_id.clone(),
            });
        }
        self.batch = Some(Batch {
            generation,
            image_ids: image_ids.to_vec(),
            slots: vec![None; image_ids.len()],
            remaining: image_ids.len(),
        });
        ProbeProgress::Pending {
            remaining: image_ids.len(),
        }
    }

    /// Record one load result.
    pub fn complete(&mut self, completion: ProbeCompletion) -> ProbeProgress {
        let Some(batch) = self.batch.as_mut() else {
            tracing::trace!(
                target: "drift.probe",
                generation = %completion.generation,
                "completion with no batch in flight"
            );
            return ProbeProgress::Stale;
        };
        if completion.generation != batch.generation {
            tracing::trace!(
                target: "drift.probe",
                generation = %completion.generation,
                current = %batch.generation,
                "stale completion discarded"
            );
            return ProbeProgress::Stale;
        }
        let Some(image_id) = batch.image_ids.get(completion.slot) else {
            return ProbeProgress::Ignored;
        };
        if batch.slots[completion.slot].is_some() {
            return ProbeProgress::Ignored;
        }

        let metrics = match completion.outcome {
            Ok((width, height)) if width > 0 && height > 0 => {
                ImageMetrics::new(image_id.clone(), width, height)
            }
            Ok((width, height)) => {
                let error = ProbeError::ZeroSize {
                    image_id: image_id.clone(),
                    width,
                    height,
                };
                tracing::warn!(target: "drift.probe", %error, "using square fallback");
                ImageMetrics::fallback(image_id.clone())
            }
            Err(error) => {
                tracing::warn!(target: "drift.probe", %error, "using square fallback");
                ImageMetrics::fallback(image_id.clone())
            }
        };
        batch.slots[completion.slot] = Some(metrics);
        batch.remaining -= 1;

        if batch.remaining > 0 {
            return ProbeProgress::Pending {
                remaining: batch.remaining,
            };
        }

        let generation = batch.generation;
        let slots = self
            .batch
            .take()
            .map(|b| b.slots)
            .unwrap_or_default();
        let metrics: Vec<ImageMetrics> = slots.into_iter().flatten().collect();
        tracing::debug!(
            target: "drift.probe",
            %generation,
            images = metrics.len(),
            "probe resolved"
        );
        ProbeProgress::Resolved(metrics)
    }

    /// Abandon the batch in flight, if any. Later completions are stale.
    pub fn cancel<L: ImageLoader + ?Sized>(&mut self, loader: &mut L) -> Option<Generation> {
        let batch = self.batch.take()?;
        loader.abort(batch.generation);
        self.generations.advance();
        tracing::debug!(
            target: "drift.probe",
            generation = %batch.generation,
            outstanding = batch.remaining,
            "probe cancelled"
        );
        Some(batch.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn resolves_in_request_order() {
        let mut loader = QueuedImageLoader::new();
        let mut prober = MetricsProber::new();
        let progress = prober.begin(&ids(&["a", "b", "c"]), &mut loader);
        assert_eq!(progress, ProbeProgress::Pending { remaining: 3 });

        let requests = loader.drain_requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            prober.complete(ProbeCompletion::loaded(&requests[2], 30, 60)),
            ProbeProgress::Pending { remaining: 2 }
        );
        prober.complete(ProbeCompletion::loaded(&requests[0], 10, 10));
        let ProbeProgress::Resolved(metrics) =
            prober.complete(ProbeCompletion::loaded(&requests[1], 40, 20))
        else {
            panic!("expected resolution");
        };
        let names: Vec<&str> = metrics.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(metrics[1].aspect, 0.5);
        assert_eq!(metrics[2].aspect, 2.0);
        assert!(!prober.is_pending());
    }

    #[test]
    fn failures_fall_back_to_square() {
        let mut loader = QueuedImageLoader::new();
        let mut prober = MetricsProber::new();
        prober.begin(&ids(&["ok", "broken", "empty"]), &mut loader);
        let requests = loader.drain_requests();
        prober.complete(ProbeCompletion::loaded(&requests[0], 300, 200));
        prober.complete(ProbeCompletion::failed(&requests[1], "404"));
        let ProbeProgress::Resolved(metrics) =
            prober.complete(ProbeCompletion::loaded(&requests[2], 0, 100))
        else {
            panic!("expected resolution");
        };
        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics[1], ImageMetrics::fallback("broken"));
        assert_eq!(metrics[2], ImageMetrics::fallback("empty"));
    }

    #[test]
    fn new_batch_makes_old_results_stale() {
        let mut loader = QueuedImageLoader::new();
        let mut prober = MetricsProber::new();
        prober.begin(&ids(&["old"]), &mut loader);
        let old = loader.pending()[0].clone();

        prober.begin(&ids(&["new"]), &mut loader);
        assert_eq!(loader.aborted(), &[old.generation]);
        assert_eq!(loader.pending().len(), 1);
        assert_eq!(
            prober.complete(ProbeCompletion::loaded(&old, 10, 10)),
            ProbeProgress::Stale
        );
        assert_eq!(prober.remaining(), 1);
    }

    #[test]
    fn cancel_discards_late_results() {
        let mut loader = QueuedImageLoader::new();
        let mut prober = MetricsProber::new();
        prober.begin(&ids(&["a"]), &mut loader);
        let request = loader.drain_requests().remove(0);
        assert_eq!(prober.cancel(&mut loader), Some(request.generation));
        assert!(prober.current_generation() > request.generation);
        assert_eq!(
            prober.complete(ProbeCompletion::loaded(&request, 1, 1)),
            ProbeProgress::Stale
        );
        assert_eq!(prober.cancel(&mut loader), None);
    }

    #[test]
    fn duplicate_and_unknown_slots_are_ignored() {
        let mut loader = QueuedImageLoader::new();
        let mut prober = MetricsProber::new();
        prober.begin(&ids(&["a", "b"]), &mut loader);
        let requests = loader.drain_requests();
        prober.complete(ProbeCompletion::loaded(&requests[0], 1, 1));
        assert_eq!(
            prober.complete(ProbeCompletion::loaded(&requests[0], 1, 1)),
            ProbeProgress::Ignored
        );
        let bogus = LoadRequest {
            slot: 9,
            ..requests[1].clone()
        };
        assert_eq!(
            prober.complete(ProbeCompletion::loaded(&bogus, 1, 1)),
            ProbeProgress::Ignored
        );
        assert_eq!(prober.remaining(), 1);
    }

    #[test]
    fn empty_batch_resolves_immediately() {
        let mut loader = QueuedImageLoader::new();
        let mut prober = MetricsProber::new();
        assert_eq!(
            prober.begin(&[], &mut loader),
            ProbeProgress::Resolved(Vec::new())
        );
        assert!(loader.pending().is_empty());
        assert!(!prober.is_pending());
    }
}
