//! First-frame extraction integration tests.

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use framebar::{ExtractOptions, FrameExtractor, FrameRenderer, Timestamp};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[test]
fn first_frame_returns_one_jpeg() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let images = FrameExtractor::default().first_frame(path).expect("first frame");
    assert_eq!(images.len(), 1);

    let image = image::load_from_memory(&images[0]).expect("decode");
    assert_eq!((image.width(), image.height()), (480, 360));
}

#[test]
fn first_frame_matches_renderer_at_zero() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let options = ExtractOptions::new();
    let images = FrameExtractor::new(options.clone())
        .first_frame(path)
        .expect("first frame");
    let mut renderer = FrameRenderer::open(path, &options).expect("open");
    let direct = renderer.render_jpeg(Timestamp::ZERO).expect("render");
    assert_eq!(images[0], direct);
}

#[test]
fn renderer_rejects_timestamp_between_frames() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    // 30 fps: 1/60 s lies between frame 0 and frame 1.
    let mut renderer = FrameRenderer::open(path, &ExtractOptions::new()).expect("open");
    assert!(renderer.render(Timestamp::new(1, 60)).is_err());
    assert!(renderer.render(Timestamp::new(1, 30)).is_ok());
}

#[test]
fn renderer_rejects_timestamp_past_end() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut renderer = FrameRenderer::open(path, &ExtractOptions::new()).expect("open");
    assert!(renderer.render(Timestamp::from_millis(3_600_000)).is_err());
}

#[test]
fn callback_delivers_first_frame_once() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let (sender, receiver) = mpsc::channel();
    FrameExtractor::default().first_frame_with_callback(path, move |result| {
        sender.send(result).expect("receiver alive");
    });

    let reply = receiver
        .recv_timeout(Duration::from_secs(60))
        .expect("callback invoked");
    assert_eq!(reply.map(|images| images.len()), Some(1));
    assert!(receiver.recv_timeout(Duration::from_millis(200)).is_err());
}
