#![forbid(unsafe_code)]

//! End-to-end lifecycle scenarios for `CollageViewer`.
//!
//! Each test drives the viewer the way a host would: open, feed load
//! results, deliver frames, send pointer and key input, and inspect the
//! queued host commands.
//!
//! Run:
//!   cargo test -p drift-runtime --test lifecycle_scenarios

use std::time::Duration;

use drift_core::{
    KeyCode, ManualFrameScheduler, PanIgnoredReason, PanMotion, PanOffset, Point, PointerButton,
};
use drift_runtime::{
    CollageViewer, HostCommand, ProbeCompletion, ProbeProgress, QueuedImageLoader, ViewPhase,
    ViewerConfig,
};

type Viewer = CollageViewer<ManualFrameScheduler, QueuedImageLoader>;

const FRAME: Duration = Duration::from_millis(16);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn viewer_with(config: ViewerConfig) -> Viewer {
    CollageViewer::new(config, ManualFrameScheduler::new(), QueuedImageLoader::new())
        .expect("valid config")
}

fn viewer() -> Viewer {
    viewer_with(ViewerConfig::default())
}

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_owned()).collect()
}

/// Deliver frames every 16 ms from `now` until the viewer stops asking or
/// `until` passes. Returns the time after the last frame.
fn run_frames(viewer: &mut Viewer, mut now: Duration, until: Duration) -> Duration {
    while let Some(token) = viewer.pending_frame() {
        if now > until {
            break;
        }
        viewer.scheduler_mut().take_pending();
        assert!(viewer.on_frame(token, now));
        now += FRAME;
    }
    now
}

/// Answer every queued load with a 4:3 landscape image.
fn load_all(viewer: &mut Viewer) {
    for request in viewer.loader_mut().drain_requests() {
        viewer.on_image_loaded(ProbeCompletion::loaded(&request, 1600, 1200));
    }
}

/// Open `subject`, resolve its images, size the viewport and run frames
/// until the content is visible.
fn open_ready(viewer: &mut Viewer, subject: &str, images: &[&str]) -> Duration {
    viewer.resize(1200.0, 800.0);
    viewer.open(subject, ids(images));
    load_all(viewer);
    let now = run_frames(viewer, Duration::ZERO, ms(1_000));
    assert_eq!(viewer.phase(), ViewPhase::ContentVisible);
    assert!(viewer.layout().is_some());
    viewer.drain_commands();
    now
}

/// Drag pointer 1 left and up at 2 px/ms for 48 ms, releasing at +50 ms.
fn fling(viewer: &mut Viewer, start: Duration) -> Duration {
    let origin = Point::new(600.0, 400.0);
    let down = viewer.pointer_down(1, PointerButton::Primary, origin, start);
    assert!(!down.is_ignored());
    viewer.capture_acquired(1);
    for step in 1..=3u32 {
        let d = f64::from(step) * 32.0;
        let at = start + ms(u64::from(step) * 16);
        viewer.pointer_move(1, Point::new(origin.x - d, origin.y - d / 2.0), at);
    }
    let up_at = start + ms(50);
    viewer.pointer_up(1, up_at);
    up_at
}

// ── Probe generations ───────────────────────────────────────────────────

#[test]
fn replaced_subject_never_sees_stale_metrics() {
    let mut v = viewer();
    v.resize(1200.0, 800.0);
    v.open("subject-1", ids(&["one-a.jpg", "one-b.jpg"]));
    let stale = v.loader_mut().drain_requests();
    assert_eq!(stale.len(), 2);

    v.open("subject-2", ids(&["two.jpg"]));
    assert_eq!(v.phase(), ViewPhase::Opening);

    // Results for the first subject arrive late.
    for request in &stale {
        let progress = v.on_image_loaded(ProbeCompletion::loaded(request, 900, 300));
        assert_eq!(progress, ProbeProgress::Stale);
    }
    assert!(v.metrics().is_none());

    load_all(&mut v);
    run_frames(&mut v, Duration::ZERO, ms(1_000));
    let layout = v.layout().expect("layout for subject-2");
    assert!(layout.items.iter().all(|item| item.image_id == "two.jpg"));
    assert_eq!(v.subject().map(|s| s.id.as_str()), Some("subject-2"));
}

#[test]
fn replacing_while_visible_keeps_phase_and_recentres() {
    let mut v = viewer();
    let now = open_ready(&mut v, "subject-1", &["a.jpg"]);
    let revision = v.layout_revision();

    v.open("subject-2", ids(&["b.jpg", "c.jpg"]));
    assert_eq!(v.phase(), ViewPhase::ContentVisible);
    assert!(v.layout().is_none());
    assert_eq!(v.offset(), PanOffset::ZERO);

    load_all(&mut v);
    run_frames(&mut v, now, now + ms(100));
    let layout = v.layout().expect("relayout");
    assert!(v.layout_revision() > revision);
    assert_eq!(v.offset(), layout.pan_bounds().center());
}

#[test]
fn failed_loads_still_produce_a_layout() {
    let mut v = viewer();
    v.resize(1024.0, 768.0);
    v.open("broken", ids(&["gone.jpg", "ok.jpg"]));
    let requests = v.loader_mut().drain_requests();
    v.on_image_loaded(ProbeCompletion::failed(&requests[0], "404"));
    v.on_image_loaded(ProbeCompletion::loaded(&requests[1], 800, 400));
    run_frames(&mut v, Duration::ZERO, ms(1_000));

    let layout = v.layout().expect("layout");
    let gone = layout
        .items
        .iter()
        .find(|item| item.image_id == "gone.jpg")
        .expect("fallback tile");
    assert_eq!(gone.width_px, gone.height_px);
}

// ── Close paths ─────────────────────────────────────────────────────────

#[test]
fn escape_during_drag_releases_capture_and_refuses_input() {
    let mut v = viewer();
    let now = open_ready(&mut v, "drag", &["a.jpg", "b.jpg"]);

    v.pointer_down(7, PointerButton::Primary, Point::new(500.0, 300.0), now);
    v.capture_acquired(7);
    v.pointer_move(7, Point::new(450.0, 280.0), now + ms(16));
    assert_eq!(
        v.drain_commands(),
        vec![HostCommand::AcquirePointerCapture { pointer_id: 7 }]
    );

    assert!(v.on_key(&KeyCode::from_dom_key("Escape"), now + ms(20)));
    assert_eq!(v.phase(), ViewPhase::Closing);
    assert_eq!(
        v.drain_commands(),
        vec![HostCommand::ReleasePointerCapture { pointer_id: 7 }]
    );
    assert!(!v.pan().is_dragging());

    let refused = v.pointer_down(8, PointerButton::Primary, Point::new(1.0, 1.0), now + ms(30));
    assert_eq!(refused.ignored_reason(), Some(PanIgnoredReason::Disabled));
    let moved = v.pointer_move(7, Point::new(10.0, 10.0), now + ms(32));
    assert!(moved.is_ignored());
}

#[test]
fn close_stops_momentum_synchronously() {
    let mut v = viewer();
    let now = open_ready(&mut v, "coast", &["a.jpg"]);
    let up = fling(&mut v, now);
    assert!(v.pan().is_coasting());
    run_frames(&mut v, up, up + ms(48));
    assert!(v.pan().is_coasting());

    let frozen = v.offset();
    v.close(up + ms(50));
    assert_eq!(v.pan().motion(), PanMotion::Idle);
    assert!(v.velocity().is_zero());
    run_frames(&mut v, up + ms(50), up + ms(300));
    assert_eq!(v.offset(), frozen);
}

#[test]
fn reopen_after_close_starts_clean() {
    let mut v = viewer();
    let now = open_ready(&mut v, "first", &["a.jpg"]);
    let up = fling(&mut v, now);
    v.drain_commands();
    v.close(up);
    let end = run_frames(&mut v, up, up + ms(2_000));
    assert_eq!(v.phase(), ViewPhase::Closed);
    assert!(v.pending_frame().is_none());
    assert!(v.layout().is_none());
    assert!(v.metrics().is_none());
    assert_eq!(v.offset(), PanOffset::ZERO);
    assert!(v.velocity().is_zero());
    assert_eq!(
        v.drain_commands(),
        vec![HostCommand::UnlockPageScroll, HostCommand::UnlistenKeys]
    );

    let commit = v.commit();
    v.open("second", ids(&["b.jpg"]));
    assert_eq!(v.commit(), commit + 1);
    assert!(!v.flags().visible);
    assert_eq!(
        v.drain_commands(),
        vec![HostCommand::LockPageScroll, HostCommand::ListenKeys]
    );
    load_all(&mut v);
    run_frames(&mut v, end, end + ms(1_000));
    let layout = v.layout().expect("fresh layout");
    assert_eq!(v.offset(), layout.pan_bounds().center());
}

// ── Pointer input ───────────────────────────────────────────────────────

#[test]
fn fling_coasts_and_frame_loop_stops_when_settled() {
    let mut v = viewer();
    let now = open_ready(&mut v, "fling", &["a.jpg", "b.jpg", "c.jpg"]);
    let before = v.offset();
    let up = fling(&mut v, now);
    assert_eq!(
        v.drain_commands(),
        vec![
            HostCommand::AcquirePointerCapture { pointer_id: 1 },
            HostCommand::ReleasePointerCapture { pointer_id: 1 },
        ]
    );
    assert!(v.pan().is_coasting());
    assert!(v.pending_frame().is_some());

    let released_at = v.offset();
    assert!(released_at.x > before.x);
    run_frames(&mut v, up, up + ms(10_000));
    assert!(!v.pan().is_coasting());
    assert!(v.pending_frame().is_none());
    assert!(v.velocity().is_zero());
    // kept moving in the drag direction after release
    assert!(v.offset().x > released_at.x);
    let bounds = v.layout().expect("layout").pan_bounds();
    assert!(bounds.contains(v.offset()));
}

#[test]
fn lost_capture_ends_drag_without_momentum() {
    let mut v = viewer();
    let now = open_ready(&mut v, "lost", &["a.jpg"]);
    v.pointer_down(3, PointerButton::Primary, Point::new(300.0, 300.0), now);
    v.capture_acquired(3);
    v.pointer_move(3, Point::new(200.0, 300.0), now + ms(16));
    v.lost_pointer_capture(3);
    assert_eq!(v.pan().motion(), PanMotion::Idle);
    assert!(v.pending_frame().is_none());
}

#[test]
fn pointer_cancel_behaves_like_release() {
    let mut v = viewer();
    let now = open_ready(&mut v, "cancel", &["a.jpg"]);
    let origin = Point::new(600.0, 400.0);
    v.pointer_down(2, PointerButton::Primary, origin, now);
    for step in 1..=3u64 {
        let x = origin.x - step as f64 * 32.0;
        v.pointer_move(2, Point::new(x, origin.y), now + ms(step * 16));
    }
    v.pointer_cancel(2, now + ms(50));
    assert!(v.pan().is_coasting());
}

#[test]
fn capture_unavailable_gives_a_static_collage() {
    let mut config = ViewerConfig::default();
    config.pan.pointer_capture = false;
    let mut v = viewer_with(config);
    let now = open_ready(&mut v, "static", &["a.jpg"]);
    let centred = v.offset();

    let down = v.pointer_down(1, PointerButton::Primary, Point::new(10.0, 10.0), now);
    assert_eq!(down.ignored_reason(), Some(PanIgnoredReason::CaptureUnavailable));
    v.pointer_move(1, Point::new(300.0, 300.0), now + ms(16));
    v.pointer_up(1, now + ms(20));
    assert_eq!(v.offset(), centred);
    assert!(v.drain_commands().is_empty());
}

#[test]
fn input_before_content_is_visible_is_refused() {
    let mut v = viewer();
    v.resize(1200.0, 800.0);
    v.open("early", ids(&["a.jpg"]));
    load_all(&mut v);
    let down = v.pointer_down(1, PointerButton::Primary, Point::new(10.0, 10.0), Duration::ZERO);
    assert_eq!(down.ignored_reason(), Some(PanIgnoredReason::Disabled));
}

#[test]
fn resize_during_coast_keeps_offset_in_bounds() {
    let mut v = viewer();
    let now = open_ready(&mut v, "resize", &["a.jpg", "b.jpg"]);
    let up = fling(&mut v, now);
    v.resize(500.0, 400.0);
    let bounds = v.layout().expect("layout").pan_bounds();
    assert!(bounds.contains(v.offset()));
    run_frames(&mut v, up, up + ms(10_000));
    assert!(bounds.contains(v.offset()));
}
