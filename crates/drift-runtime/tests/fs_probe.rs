#![forbid(unsafe_code)]

//! Probing image files from disk.
//!
//! Run:
//!   cargo test -p drift-runtime --features fs-probe --test fs_probe

use std::path::Path;

use drift_layout::ImageMetrics;
use drift_runtime::{FsImageLoader, MetricsProber, ProbeError, ProbeProgress};

fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
    let img = image::RgbImage::new(width, height);
    img.save(dir.join(name)).expect("write png");
}

fn probe(loader: &mut FsImageLoader, names: &[&str]) -> Vec<ImageMetrics> {
    let ids: Vec<String> = names.iter().map(|s| (*s).to_owned()).collect();
    let mut prober = MetricsProber::new();
    let mut progress = prober.begin(&ids, loader);
    for completion in loader.drain_completions() {
        progress = prober.complete(completion);
    }
    match progress {
        ProbeProgress::Resolved(metrics) => metrics,
        other => panic!("probe did not resolve: {other:?}"),
    }
}

#[test]
fn reads_dimensions_from_headers() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_png(dir.path(), "wide.png", 40, 20);
    write_png(dir.path(), "tall.png", 10, 30);

    let mut loader = FsImageLoader::new(dir.path());
    let metrics = probe(&mut loader, &["wide.png", "tall.png"]);
    assert_eq!(metrics[0], ImageMetrics::new("wide.png", 40, 20));
    assert_eq!(metrics[1].aspect, 3.0);
}

#[test]
fn missing_and_corrupt_files_fall_back() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("junk.png"), b"not an image").expect("write");

    let mut loader = FsImageLoader::new(dir.path());
    let metrics = probe(&mut loader, &["absent.png", "junk.png"]);
    assert_eq!(metrics[0], ImageMetrics::fallback("absent.png"));
    assert_eq!(metrics[1], ImageMetrics::fallback("junk.png"));
}

#[test]
fn missing_file_is_reported_as_unavailable() {
    use drift_runtime::{Generation, ImageLoader, LoadRequest};

    let dir = tempfile::tempdir().expect("temp dir");
    let mut loader = FsImageLoader::new(dir.path());
    loader.load(LoadRequest {
        generation: Generation::new(1),
        slot: 0,
        image_id: "absent.png".into(),
    });
    let completion = loader.drain_completions().remove(0);
    assert!(matches!(
        completion.outcome,
        Err(ProbeError::Unavailable { ref image_id, .. }) if image_id == "absent.png"
    ));
}

#[test]
fn abort_drops_queued_completions() {
    use drift_runtime::{Generation, ImageLoader, LoadRequest};

    let dir = tempfile::tempdir().expect("temp dir");
    write_png(dir.path(), "a.png", 2, 2);
    let mut loader = FsImageLoader::new(dir.path());
    loader.load(LoadRequest {
        generation: Generation::new(3),
        slot: 0,
        image_id: "a.png".into(),
    });
    loader.abort(Generation::new(3));
    assert!(loader.drain_completions().is_empty());
}
