//! # framebar
//!
//! Key-frame thumbnail extraction for video scrubber bars.
//!
//! `framebar` scans a video's key frames from packet headers alone, picks an
//! evenly spaced subset, renders each one as a small JPEG in parallel and
//! hands the thumbnails back in time order. It is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Thumbnails for a scrubber bar
//!
//! ```no_run
//! use framebar::{ExtractOptions, FrameExtractor, KeyFrameRequest};
//!
//! let extractor = FrameExtractor::new(ExtractOptions::new());
//! let thumbnails = extractor
//!     .key_frames(&KeyFrameRequest::new("input.mp4").with_frame_interval(2000))
//!     .unwrap();
//! println!("{} thumbnails", thumbnails.len());
//! ```
//!
//! ### Poster frame
//!
//! ```no_run
//! use framebar::FrameExtractor;
//!
//! let poster = FrameExtractor::default().first_frame("input.mp4").unwrap();
//! std::fs::write("poster.jpg", &poster[0]).unwrap();
//! ```
//!
//! ### Lower-level building blocks
//!
//! ```no_run
//! use framebar::{SelectionPlan, VideoFile, scan_key_frames, select_frames};
//!
//! let mut file = VideoFile::open("input.mp4").unwrap();
//! let key_frames = scan_key_frames(&mut file).unwrap();
//! let plan = SelectionPlan::new(key_frames.len(), Some(8), None, file.metadata().duration, false);
//! for timestamp in select_frames(&key_frames.timestamps, &plan) {
//!     println!("{timestamp}");
//! }
//! ```
//!
//! ## Features
//!
//! - **Packet-level key-frame scan**: no pixel decoding to find key frames
//! - **Count or interval planning**: "at most N frames" or "one every T ms"
//! - **Exact timestamps**: each thumbnail is the frame at exactly the
//!   selected key-frame time, never a neighbour
//! - **Orientation aware**: display matrices and `rotate` tags are applied
//! - **Parallel rendering**: one demuxer per rayon worker, results in order
//! - **Progress & cancellation**: `ProgressCallback`, `CancellationToken`
//!   and per-call deadlines
//! - **Method-call bridge**: `getKeyFrames` / `getFirstFrame` over JSON
//!   arguments for host runtimes
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `FramesFuture` entry points via Tokio |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod assembler;
pub mod channel;
pub mod compression;
pub mod configuration;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod keyframe;
pub mod metadata;
pub mod orientation;
pub mod planner;
pub mod progress;
pub mod render;
pub mod selector;
#[cfg(feature = "async")]
pub mod stream;
pub mod timestamp;
pub mod video_file;

pub use assembler::{OrderedAssembler, RenderedFrame};
pub use channel::{CHANNEL_NAME, MethodCall, MethodChannel, MethodResponse};
pub use compression::compress_jpeg;
pub use configuration::ExtractOptions;
pub use error::FrameBarError;
pub use extractor::{FrameExtractor, KeyFrameRequest};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use keyframe::{KeyFrameSet, scan_key_frames, scan_key_frames_with_options};
pub use metadata::{MediaMetadata, VideoMetadata};
pub use orientation::{Orientation, Rotation};
pub use planner::{SelectionPlan, plan_target_count};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use render::{FrameRenderer, fit_within};
pub use selector::{select_frames, select_uniform};
#[cfg(feature = "async")]
pub use stream::FramesFuture;
pub use timestamp::Timestamp;
pub use video_file::VideoFile;
