//! Video track metadata.
//!
//! Extracted once when a [`VideoFile`](crate::VideoFile) is opened and
//! cached for the lifetime of the handle.

use std::time::Duration;

use ffmpeg_next::Rational;

use crate::orientation::Orientation;
use crate::timestamp::Timestamp;

/// Metadata for the first video track of a file.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Coded frame width in pixels.
    pub width: u32,
    /// Coded frame height in pixels.
    pub height: u32,
    /// Frames per second (approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`, `"hevc"`).
    pub codec: String,
    /// Time base of the track's packet timestamps.
    pub time_base: Rational,
    /// Presentation time of the first sample, clamped to zero.
    pub start_time: Timestamp,
    /// Display transform recorded on the track.
    pub orientation: Orientation,
    /// Index of the track among all streams in the container.
    pub stream_index: usize,
}

impl VideoMetadata {
    /// Width and height after applying [`orientation`](VideoMetadata::orientation).
    pub fn display_dimensions(&self) -> (u32, u32) {
        self.orientation.display_dimensions(self.width, self.height)
    }
}

/// Metadata for a video file.
#[derive(Debug, Clone)]
#[must_use]
pub struct MediaMetadata {
    /// First video track, if any.
    pub video: Option<VideoMetadata>,
    /// Number of video tracks in the container.
    pub video_track_count: usize,
    /// Total duration of the file.
    pub duration: Duration,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}

impl MediaMetadata {
    /// Duration in whole milliseconds.
    pub fn duration_millis(&self) -> u64 {
        self.duration.as_millis().min(u64::MAX as u128) as u64
    }
}
