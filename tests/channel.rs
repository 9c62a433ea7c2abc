//! Method-call bridge integration tests.

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use framebar::{CHANNEL_NAME, MethodCall, MethodChannel, MethodResponse};
use serde_json::json;

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[test]
fn channel_name_is_stable() {
    assert_eq!(CHANNEL_NAME, "com.mimao.beaver.frames/frame_extractor");
    assert_eq!(MethodChannel::default().name(), CHANNEL_NAME);
}

#[test]
fn get_key_frames_returns_images() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let channel = MethodChannel::default();
    let call = MethodCall::new(
        "getKeyFrames",
        json!({ "path": path, "frameCount": 3, "skipFirstFrame": true }),
    );
    match channel.handle_blocking(&call) {
        MethodResponse::Success(Some(images)) => assert_eq!(images.len(), 2),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn get_first_frame_returns_one_image() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let channel = MethodChannel::default();
    let (sender, receiver) = mpsc::channel();
    channel.handle(
        MethodCall::new("getFirstFrame", json!({ "path": path })),
        move |response| sender.send(response).expect("receiver alive"),
    );

    let response = receiver
        .recv_timeout(Duration::from_secs(60))
        .expect("reply delivered");
    match response {
        MethodResponse::Success(Some(images)) => assert_eq!(images.len(), 1),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn invalid_arguments_reply_immediately() {
    let channel = MethodChannel::default();
    let (sender, receiver) = mpsc::channel();
    channel.handle(
        MethodCall::new("getKeyFrames", json!({ "frameCount": 3 })),
        move |response| sender.send(response).expect("receiver alive"),
    );

    // Rejection happens on the calling thread, before `handle` returns.
    let response = receiver.try_recv().expect("reply already delivered");
    assert_eq!(
        response.to_json(),
        json!({ "status": "error", "code": "INVALID_ARGUMENT", "message": "Invalid argument" })
    );
}

#[test]
fn unknown_method_replies_not_implemented() {
    let channel = MethodChannel::default();
    let (sender, receiver) = mpsc::channel();
    channel.handle(
        MethodCall::new("getEveryFrame", json!({ "path": "x.mp4" })),
        move |response| sender.send(response).expect("receiver alive"),
    );
    assert_eq!(
        receiver.try_recv().expect("reply already delivered"),
        MethodResponse::NotImplemented
    );
}

#[test]
fn cover_art_only_file_replies_with_no_images() {
    let path = "tests/fixtures/cover_art.m4a";
    if !Path::new(path).exists() {
        return;
    }

    let response = MethodChannel::default()
        .handle_blocking(&MethodCall::new("getKeyFrames", json!({ "path": path })));
    assert_eq!(response, MethodResponse::Success(None));
}
