//! Progress, cancellation and deadline integration tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use framebar::{
    CancellationToken, ExtractOptions, FrameBarError, FrameExtractor, KeyFrameRequest,
    OperationType, ProgressCallback, ProgressInfo, VideoFile, scan_key_frames_with_options,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[derive(Default)]
struct RecordingProgress {
    infos: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().expect("poisoned").push(info.clone());
    }
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn cancelled_extraction_returns_error() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let token = CancellationToken::new();
    token.cancel();

    let extractor = FrameExtractor::new(ExtractOptions::new().with_cancellation(token));
    let result = extractor.key_frames(&KeyFrameRequest::new(path));

    match result {
        Err(FrameBarError::Cancelled) => {}
        other => panic!("Expected Cancelled, got: {other:?}"),
    }
}

#[test]
fn expired_deadline_returns_error() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let extractor = FrameExtractor::new(ExtractOptions::new().with_deadline(Duration::ZERO));
    let result = extractor.key_frames(&KeyFrameRequest::new(path));
    assert!(matches!(result, Err(FrameBarError::DeadlineExceeded(_))));
}

#[test]
fn rendering_reports_every_frame() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let recorder = Arc::new(RecordingProgress::default());
    let extractor = FrameExtractor::new(ExtractOptions::new().with_progress(recorder.clone()));
    let thumbnails = extractor
        .key_frames(&KeyFrameRequest::new(path).with_frame_count(4))
        .expect("extract");

    let infos = recorder.infos.lock().expect("poisoned");
    let rendering: Vec<&ProgressInfo> = infos
        .iter()
        .filter(|info| info.operation == OperationType::FrameRendering)
        .collect();
    let last = rendering.last().expect("rendering progress");
    assert_eq!(last.total, Some(4));
    assert_eq!(last.current, 4);
    assert_eq!(last.percentage, Some(100.0));
    assert_eq!(thumbnails.len(), 4);
}

#[test]
fn scan_reports_key_frames() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let recorder = Arc::new(RecordingProgress::default());
    let options = ExtractOptions::new().with_progress(recorder.clone());
    let mut file = VideoFile::open(path).expect("open");
    let key_frames = scan_key_frames_with_options(&mut file, &options).expect("scan");

    let infos = recorder.infos.lock().expect("poisoned");
    let scan_reports = infos
        .iter()
        .filter(|info| info.operation == OperationType::KeyFrameScan && info.current_timestamp.is_some())
        .count();
    assert_eq!(scan_reports, key_frames.len());
}
