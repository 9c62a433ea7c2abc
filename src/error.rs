//! Error types for the `framebar` crate.
//!
//! [`FrameBarError`] is returned by every fallible operation. Only a handful
//! of variants ever reach a caller of the extraction pipeline: per-frame
//! failures are absorbed by the pipeline and simply leave a gap in the
//! result sequence.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

use crate::timestamp::Timestamp;

/// The unified error type for all `framebar` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameBarError {
    /// A required argument was missing or had the wrong type.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The video file could not be opened for sample-level reading.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video track.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// No decoded frame carried exactly the requested presentation timestamp.
    #[error("No frame at exactly {0}")]
    FrameNotFound(Timestamp),

    /// The decoded frame could not be compressed.
    #[error("Failed to encode image: {0}")]
    ImageEncodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    /// The call was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// The call ran past the deadline configured on
    /// [`ExtractOptions`](crate::ExtractOptions).
    #[error("Deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl From<FfmpegError> for FrameBarError {
    fn from(error: FfmpegError) -> Self {
        FrameBarError::Ffmpeg(error.to_string())
    }
}

impl FrameBarError {
    /// Returns `true` for errors that fail a whole call rather than a
    /// single frame.
    pub fn is_whole_call_failure(&self) -> bool {
        !matches!(
            self,
            FrameBarError::VideoDecodeError(_)
                | FrameBarError::FrameNotFound(_)
                | FrameBarError::ImageEncodeError(_)
                | FrameBarError::Image(_)
        )
    }
}
