//! Future entry points. Requires the `async` feature.

#![cfg(feature = "async")]

use std::path::Path;

use framebar::{FrameBarError, FrameExtractor, KeyFrameRequest};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[tokio::test]
async fn key_frames_future_matches_blocking_call() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let extractor = FrameExtractor::default();
    let request = KeyFrameRequest::new(path).with_frame_count(3);
    let from_future = extractor
        .key_frames_async(request.clone())
        .await
        .expect("extract");
    let blocking = extractor.key_frames(&request).expect("extract");
    assert_eq!(from_future, blocking);
}

#[tokio::test]
async fn first_frame_future_resolves() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let images = FrameExtractor::default()
        .first_frame_async(path)
        .await
        .expect("first frame");
    assert_eq!(images.len(), 1);
}

#[tokio::test]
async fn future_reports_open_failure() {
    let result = FrameExtractor::default()
        .key_frames_async(KeyFrameRequest::new("does_not_exist.mp4"))
        .await;
    assert!(matches!(result, Err(FrameBarError::FileOpen { .. })));
}
