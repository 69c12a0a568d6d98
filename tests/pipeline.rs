//! End-to-end runs of the resize pipeline against real files

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use image_resizer::parallel::{ProgressTracker, ProgressUpdate, UnitStatus};
use image_resizer::{
    CancellationSignal, ErrorKind, ImageCodec, JpegCodec, Raster, ResizeError,
    ResizeOrchestrator, RunResult, ScaleFactor, Workspace,
};
use tempfile::TempDir;

fn write_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_fn(width, height, |x, y| Rgb([(x * 7 % 256) as u8, (y * 3 % 256) as u8, 128]))
        .save(path)
        .unwrap();
}

fn output_names(dest: &Path) -> BTreeSet<String> {
    fs::read_dir(dest)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

fn dimensions(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

struct Fixture {
    _dir: TempDir,
    src: PathBuf,
    dest: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("images");
        let dest = dir.path().join("output");
        fs::create_dir_all(&src).unwrap();
        Workspace::clean(&dest).unwrap();
        Self { _dir: dir, src, dest }
    }
}

#[tokio::test]
async fn resizes_every_image_to_floored_dimensions() {
    let fx = Fixture::new();
    write_image(&fx.src.join("a.png"), 31, 17);
    write_image(&fx.src.join("b.jpg"), 40, 21);
    write_image(&fx.src.join("nested/c.jpeg"), 9, 64);
    fs::write(fx.src.join("d.txt"), b"not an image").unwrap();

    let outcome = ResizeOrchestrator::new()
        .resize_all(&fx.src, &fx.dest, ScaleFactor::new(0.5))
        .await
        .unwrap();

    assert!(matches!(outcome, RunResult::Completed(_)));
    assert_eq!(outcome.summary().written, 3);
    assert_eq!(
        output_names(&fx.dest),
        BTreeSet::from(["a.jpg".to_string(), "b.jpg".to_string(), "c.jpg".to_string()])
    );
    assert_eq!(dimensions(&fx.dest.join("a.jpg")), (15, 8));
    assert_eq!(dimensions(&fx.dest.join("b.jpg")), (20, 10));
    assert_eq!(dimensions(&fx.dest.join("c.jpg")), (4, 32));
}

#[tokio::test]
async fn upscales_with_bounded_concurrency() {
    let fx = Fixture::new();
    for i in 0..6 {
        write_image(&fx.src.join(format!("img{}.png", i)), 10 + i, 5);
    }

    let outcome = ResizeOrchestrator::new()
        .with_max_concurrent(Some(2))
        .resize_all(&fx.src, &fx.dest, ScaleFactor::new(2.0))
        .await
        .unwrap();

    assert_eq!(outcome.summary().written, 6);
    for i in 0..6 {
        assert_eq!(dimensions(&fx.dest.join(format!("img{}.jpg", i))), (2 * (10 + i), 10));
    }
}

#[tokio::test]
async fn injected_tracker_follows_the_run() {
    let fx = Fixture::new();
    write_image(&fx.src.join("a.png"), 6, 6);
    write_image(&fx.src.join("b.jpg"), 6, 6);

    let tracker = Arc::new(ProgressTracker::new());
    let mut updates = tracker.subscribe();
    let orchestrator = ResizeOrchestrator::new().with_progress(Arc::clone(&tracker));

    orchestrator
        .resize_all(&fx.src, &fx.dest, ScaleFactor::new(0.5))
        .await
        .unwrap();

    let mut written = 0;
    let mut finished = None;
    while let Ok(update) = updates.try_recv() {
        match update {
            ProgressUpdate::UnitFinished { status: UnitStatus::Written, .. } => written += 1,
            ProgressUpdate::RunFinished { snapshot } => finished = Some(snapshot),
            _ => {}
        }
    }

    assert_eq!(written, 2);
    let snapshot = finished.unwrap();
    assert_eq!((snapshot.total_files, snapshot.written), (2, 2));
    assert!(!tracker.is_active());
}

#[tokio::test]
async fn concurrent_runs_do_not_share_progress_counters() {
    let big = Fixture::new();
    let small = Fixture::new();
    for i in 0..5 {
        write_image(&big.src.join(format!("big{}.png", i)), 8, 8);
    }
    for i in 0..2 {
        write_image(&small.src.join(format!("small{}.png", i)), 8, 8);
    }

    let orchestrator = ResizeOrchestrator::new();
    let (first, second) = tokio::join!(
        orchestrator.resize_all(&big.src, &big.dest, ScaleFactor::new(0.5)),
        orchestrator.resize_all(&small.src, &small.dest, ScaleFactor::new(0.5)),
    );

    assert_eq!(first.unwrap().summary().written, 5);
    assert_eq!(second.unwrap().summary().written, 2);

    let snapshot = orchestrator.progress().snapshot();
    assert!(snapshot.total_files == 5 || snapshot.total_files == 2);
    assert_eq!(snapshot.written, snapshot.total_files);
    assert_eq!(snapshot.finished(), snapshot.total_files);
}

#[tokio::test]
async fn rerun_after_clean_reproduces_outputs() {
    let fx = Fixture::new();
    write_image(&fx.src.join("one.png"), 25, 25);
    write_image(&fx.src.join("two.jpg"), 13, 50);
    let orchestrator = ResizeOrchestrator::new();

    orchestrator.resize_all(&fx.src, &fx.dest, ScaleFactor::new(0.4)).await.unwrap();
    let first_names = output_names(&fx.dest);
    let first_dims = dimensions(&fx.dest.join("two.jpg"));

    Workspace::clean(&fx.dest).unwrap();
    assert!(output_names(&fx.dest).is_empty());

    orchestrator.resize_all(&fx.src, &fx.dest, ScaleFactor::new(0.4)).await.unwrap();
    assert_eq!(output_names(&fx.dest), first_names);
    assert_eq!(dimensions(&fx.dest.join("two.jpg")), first_dims);
}

#[tokio::test]
async fn colliding_basenames_produce_a_single_output() {
    let fx = Fixture::new();
    write_image(&fx.src.join("same.png"), 8, 8);
    write_image(&fx.src.join("sub/same.jpg"), 8, 8);

    let outcome = ResizeOrchestrator::new()
        .resize_all(&fx.src, &fx.dest, ScaleFactor::new(1.0))
        .await
        .unwrap();

    assert_eq!(outcome.summary().written, 2);
    assert_eq!(output_names(&fx.dest), BTreeSet::from(["same.jpg".to_string()]));
}

#[tokio::test]
async fn corrupt_input_fails_the_run() {
    let fx = Fixture::new();
    write_image(&fx.src.join("good1.png"), 10, 10);
    write_image(&fx.src.join("good2.jpg"), 10, 10);
    fs::write(fx.src.join("broken.png"), b"\x89PNG but not really").unwrap();

    let err = ResizeOrchestrator::new()
        .resize_all(&fx.src, &fx.dest, ScaleFactor::new(0.5))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(err.file_path(), Some(&fx.src.join("broken.png")));
}

#[tokio::test]
async fn corrupt_input_without_cancellation_still_fails_cancellable_run() {
    let fx = Fixture::new();
    write_image(&fx.src.join("fine.png"), 10, 10);
    fs::write(fx.src.join("broken.jpg"), b"nope").unwrap();

    let signal = CancellationSignal::new();
    let err = ResizeOrchestrator::new()
        .resize_all_cancellable(&fx.src, &fx.dest, ScaleFactor::new(0.5), &signal)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(!signal.is_tripped());
}

#[tokio::test]
async fn degenerate_scale_is_rejected_by_codec() {
    let fx = Fixture::new();
    write_image(&fx.src.join("small.png"), 4, 4);

    let err = ResizeOrchestrator::new()
        .resize_all(&fx.src, &fx.dest, ScaleFactor::new(0.0))
        .await
        .unwrap_err();

    assert!(matches!(err, ResizeError::InvalidDimensions { width: 0, height: 0, .. }));
    assert!(output_names(&fx.dest).is_empty());
}

#[tokio::test]
async fn sentinel_cancels_units_that_have_not_started() {
    let fx = Fixture::new();
    // The png pass is dispatched first, so the sentinel is the first unit
    write_image(&fx.src.join("stop.png"), 12, 12);
    write_image(&fx.src.join("b.jpg"), 12, 12);
    write_image(&fx.src.join("c.jpg"), 12, 12);
    write_image(&fx.src.join("d.jpeg"), 12, 12);

    let signal = CancellationSignal::new();
    let outcome = ResizeOrchestrator::new()
        .with_sentinel("stop")
        .with_max_concurrent(Some(1))
        .resize_all_cancellable(&fx.src, &fx.dest, ScaleFactor::new(0.5), &signal)
        .await
        .unwrap();

    assert!(signal.is_tripped());
    assert!(outcome.is_cancelled());
    assert_eq!(outcome.summary().written, 1);
    assert_eq!(outcome.summary().cancelled, 3);
    assert_eq!(output_names(&fx.dest), BTreeSet::from(["stop.jpg".to_string()]));
}

#[tokio::test]
async fn sentinel_run_is_cancelled_without_concurrency_cap() {
    let fx = Fixture::new();
    write_image(&fx.src.join("6CxiNWJceow.png"), 16, 16);
    for i in 0..5 {
        write_image(&fx.src.join(format!("other{}.jpg", i)), 16, 16);
    }

    let signal = CancellationSignal::new();
    let outcome = ResizeOrchestrator::new()
        .resize_all_cancellable(&fx.src, &fx.dest, ScaleFactor::new(0.5), &signal)
        .await
        .unwrap();

    assert!(outcome.is_cancelled());
    let summary = outcome.summary();
    assert_eq!(summary.written + summary.cancelled, 6);
    // The sentinel trips the signal after its last checkpoint
    assert!(fx.dest.join("6CxiNWJceow.jpg").exists());
    assert_eq!(output_names(&fx.dest).len(), summary.written);
}

#[tokio::test]
async fn pre_tripped_signal_writes_nothing() {
    let fx = Fixture::new();
    write_image(&fx.src.join("a.png"), 8, 8);
    write_image(&fx.src.join("b.jpg"), 8, 8);

    let signal = CancellationSignal::new();
    signal.signal();

    let outcome = ResizeOrchestrator::new()
        .resize_all_cancellable(&fx.src, &fx.dest, ScaleFactor::new(2.0), &signal)
        .await
        .unwrap();

    assert!(outcome.is_cancelled());
    assert_eq!(outcome.summary().cancelled, 2);
    assert!(output_names(&fx.dest).is_empty());
}

/// Codec whose encoder always fails
struct FailingEncoder(JpegCodec);

impl ImageCodec for FailingEncoder {
    fn decode(&self, bytes: &[u8]) -> image_resizer::Result<Raster> {
        self.0.decode(bytes)
    }

    fn resample(&self, raster: &Raster, width: u32, height: u32) -> image_resizer::Result<Raster> {
        self.0.resample(raster, width, height)
    }

    fn encode(&self, _raster: &Raster) -> image_resizer::Result<Vec<u8>> {
        Err(ResizeError::encode("disk says no", None))
    }
}

#[tokio::test]
async fn encoder_failure_is_reported_with_output_path() {
    let fx = Fixture::new();
    write_image(&fx.src.join("x.png"), 8, 8);

    let err = ResizeOrchestrator::new()
        .with_codec(Arc::new(FailingEncoder(JpegCodec::new())))
        .resize_all(&fx.src, &fx.dest, ScaleFactor::new(1.0))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EncodeOrWrite);
    assert_eq!(err.file_path(), Some(&fx.dest.join("x.jpg")));
}
