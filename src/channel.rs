//! Named-method call bridge.
//!
//! Hosts that cannot link the Rust API directly talk to the extractor
//! through method calls: a method name plus a JSON object of arguments.
//! [`MethodChannel`] validates the arguments, runs the pipeline and replies
//! with a [`MethodResponse`].
//!
//! | Method          | Arguments                                                         |
//! |-----------------|-------------------------------------------------------------------|
//! | `getKeyFrames`  | `path` (string), `frameCount` (int), `frameInterval` (int, ms), `skipFirstFrame` (bool) |
//! | `getFirstFrame` | `path` (string)                                                   |
//!
//! Only `path` is required. Optional arguments of the wrong type are
//! treated as absent.
//!
//! # Example
//!
//! ```no_run
//! use framebar::{MethodCall, MethodChannel, MethodResponse};
//! use serde_json::json;
//!
//! let channel = MethodChannel::default();
//! let call = MethodCall::new("getKeyFrames", json!({ "path": "input.mp4", "frameCount": 8 }));
//! match channel.handle_blocking(&call) {
//!     MethodResponse::Success(Some(images)) => println!("{} thumbnails", images.len()),
//!     other => println!("{}", other.to_json()),
//! }
//! ```

use std::path::PathBuf;

use serde_json::{Map, Value, json};

use crate::error::FrameBarError;
use crate::extractor::{FrameExtractor, KeyFrameRequest, into_reply};

/// Name the bridge is registered under on the host side.
pub const CHANNEL_NAME: &str = "com.mimao.beaver.frames/frame_extractor";

/// Method name for key-frame extraction.
pub const GET_KEY_FRAMES: &str = "getKeyFrames";

/// Method name for first-frame extraction.
pub const GET_FIRST_FRAME: &str = "getFirstFrame";

/// Error code for rejected arguments.
pub const INVALID_ARGUMENT_CODE: &str = "INVALID_ARGUMENT";

/// One incoming call.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Method name, e.g. `getKeyFrames`.
    pub method: String,
    /// Arguments, expected to be a JSON object.
    pub arguments: Value,
}

impl MethodCall {
    /// Build a call.
    pub fn new<S: Into<String>>(method: S, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// Reply to a [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodResponse {
    /// The call ran. `None` means extraction failed as a whole.
    Success(Option<Vec<Vec<u8>>>),
    /// The call was rejected before anything ran.
    Error {
        /// Machine-readable code.
        code: String,
        /// Human-readable message.
        message: String,
    },
    /// No such method.
    NotImplemented,
}

impl MethodResponse {
    /// The response for missing or malformed arguments.
    pub fn invalid_argument() -> Self {
        MethodResponse::Error {
            code: INVALID_ARGUMENT_CODE.to_string(),
            message: "Invalid argument".to_string(),
        }
    }

    /// Serialise for JSON hosts. Image bytes become arrays of integers.
    pub fn to_json(&self) -> Value {
        match self {
            MethodResponse::Success(result) => json!({
                "status": "success",
                "result": result,
            }),
            MethodResponse::Error { code, message } => json!({
                "status": "error",
                "code": code,
                "message": message,
            }),
            MethodResponse::NotImplemented => json!({ "status": "notImplemented" }),
        }
    }
}

/// A validated call.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Method {
    KeyFrames(KeyFrameRequest),
    FirstFrame(PathBuf),
}

impl Method {
    /// `Ok(None)` for unknown methods.
    fn parse(call: &MethodCall) -> Result<Option<Method>, FrameBarError> {
        match call.method.as_str() {
            GET_KEY_FRAMES => {
                let arguments = object(&call.arguments)?;
                let mut request = KeyFrameRequest::new(required_path(arguments)?);
                if let Some(count) = arguments.get("frameCount").and_then(Value::as_i64) {
                    request = request.with_frame_count(count);
                }
                if let Some(interval) = arguments.get("frameInterval").and_then(Value::as_i64) {
                    request = request.with_frame_interval(interval);
                }
                let skip_first = arguments
                    .get("skipFirstFrame")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                Ok(Some(Method::KeyFrames(request.with_skip_first_frame(skip_first))))
            }
            GET_FIRST_FRAME => {
                let arguments = object(&call.arguments)?;
                Ok(Some(Method::FirstFrame(required_path(arguments)?)))
            }
            _ => Ok(None),
        }
    }
}

fn object(arguments: &Value) -> Result<&Map<String, Value>, FrameBarError> {
    arguments
        .as_object()
        .ok_or_else(|| FrameBarError::InvalidArgument("arguments must be an object".to_string()))
}

fn required_path(arguments: &Map<String, Value>) -> Result<PathBuf, FrameBarError> {
    arguments
        .get("path")
        .and_then(Value::as_str)
        .map(PathBuf::from)
        .ok_or_else(|| FrameBarError::InvalidArgument("path must be a string".to_string()))
}

/// Dispatches [`MethodCall`]s to a [`FrameExtractor`].
#[derive(Debug, Clone, Default)]
pub struct MethodChannel {
    extractor: FrameExtractor,
}

impl MethodChannel {
    /// Create a channel backed by `extractor`.
    pub fn new(extractor: FrameExtractor) -> Self {
        Self { extractor }
    }

    /// Registered channel name.
    pub fn name(&self) -> &'static str {
        CHANNEL_NAME
    }

    /// Handle `call` without blocking.
    ///
    /// `reply` is invoked exactly once: immediately for rejected or unknown
    /// calls, otherwise from a pool thread when extraction completes.
    pub fn handle<F>(&self, call: MethodCall, reply: F)
    where
        F: FnOnce(MethodResponse) + Send + 'static,
    {
        match Method::parse(&call) {
            Ok(Some(Method::KeyFrames(request))) => {
                self.extractor.key_frames_with_callback(request, move |images| {
                    reply(MethodResponse::Success(images))
                })
            }
            Ok(Some(Method::FirstFrame(path))) => {
                self.extractor.first_frame_with_callback(path, move |images| {
                    reply(MethodResponse::Success(images))
                })
            }
            Ok(None) => reply(MethodResponse::NotImplemented),
            Err(error) => {
                log::debug!("Rejected {} call: {error}", call.method);
                reply(MethodResponse::invalid_argument());
            }
        }
    }

    /// Handle `call` on the current thread.
    pub fn handle_blocking(&self, call: &MethodCall) -> MethodResponse {
        match Method::parse(call) {
            Ok(Some(Method::KeyFrames(request))) => MethodResponse::Success(into_reply(
                self.extractor.key_frames(&request),
                request.path(),
            )),
            Ok(Some(Method::FirstFrame(path))) => {
                MethodResponse::Success(into_reply(self.extractor.first_frame(&path), &path))
            }
            Ok(None) => MethodResponse::NotImplemented,
            Err(error) => {
                log::debug!("Rejected {} call: {error}", call.method);
                MethodResponse::invalid_argument()
            }
        }
    }
}
