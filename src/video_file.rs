//! Core [`VideoFile`] implementation.
//!
//! `VideoFile` opens a container, locates its first video track and caches
//! the metadata the extraction pipeline needs. Every worker in the parallel
//! renderer opens its own `VideoFile`, so a handle is never shared between
//! threads.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::{
        context::Input,
        stream::{Disposition, Stream},
    },
    media::Type,
};
use ffmpeg_sys_next::AV_NOPTS_VALUE;

use crate::{
    error::FrameBarError,
    metadata::{MediaMetadata, VideoMetadata},
    orientation::Orientation,
    timestamp::Timestamp,
};

/// An opened video file.
///
/// # Example
///
/// ```no_run
/// use framebar::{FrameBarError, VideoFile};
///
/// let file = VideoFile::open("input.mp4")?;
/// println!("Duration: {:?}", file.metadata().duration);
/// # Ok::<(), FrameBarError>(())
/// ```
pub struct VideoFile {
    /// The opened FFmpeg input (demuxer) context.
    pub(crate) input_context: Input,
    /// Cached metadata extracted at open time.
    pub(crate) metadata: MediaMetadata,
    /// Path to the opened file (kept for error messages and worker re-opens).
    pub(crate) file_path: PathBuf,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("metadata", &self.metadata)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file.
    ///
    /// Initialises FFmpeg (idempotent), opens the container and reads the
    /// metadata of its first video track. A file without video opens
    /// successfully; operations that need a video track then fail with
    /// [`FrameBarError::NoVideoStream`].
    ///
    /// # Errors
    ///
    /// Returns [`FrameBarError::FileOpen`] if the file cannot be opened or
    /// its video codec parameters cannot be read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameBarError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening video file: {}", file_path.display());

        crate::ffmpeg::initialize().map_err(|error| FrameBarError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| FrameBarError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let format = input_context.format().name().to_string();
        let video_track_count = input_context
            .streams()
            .filter(is_video_track)
            .count();

        // The first video track, not FFmpeg's "best" pick.
        let video = match input_context
            .streams()
            .find(is_video_track)
        {
            Some(stream) => {
                let index = stream.index();
                let decoder_context = CodecContext::from_parameters(stream.parameters())
                    .map_err(|error| FrameBarError::FileOpen {
                        path: file_path.clone(),
                        reason: format!(
                            "Failed to read video codec parameters for stream {index}: {error}"
                        ),
                    })?;
                let decoder =
                    decoder_context
                        .decoder()
                        .video()
                        .map_err(|error| FrameBarError::FileOpen {
                            path: file_path.clone(),
                            reason: format!(
                                "Failed to create video decoder for stream {index}: {error}"
                            ),
                        })?;

                let frame_rate = stream.avg_frame_rate();
                let frames_per_second = if frame_rate.denominator() != 0 {
                    frame_rate.numerator() as f64 / frame_rate.denominator() as f64
                } else {
                    0.0
                };

                let time_base = stream.time_base();
                let start_time = if stream.start_time() == AV_NOPTS_VALUE {
                    Timestamp::ZERO
                } else {
                    Timestamp::from_pts(stream.start_time(), time_base).max_zero()
                };

                Some(VideoMetadata {
                    width: decoder.width(),
                    height: decoder.height(),
                    frames_per_second,
                    codec: decoder
                        .codec()
                        .map(|codec| codec.name().to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                    time_base,
                    start_time,
                    orientation: Orientation::from_stream(&stream),
                    stream_index: index,
                })
            }
            None => None,
        };

        let duration = container_duration(&input_context, video.as_ref());

        let metadata = MediaMetadata {
            video,
            video_track_count,
            duration,
            format,
        };

        log::info!(
            "Opened video file: {} (format={}, duration={:.2}s, video_tracks={})",
            file_path.display(),
            metadata.format,
            metadata.duration.as_secs_f64(),
            metadata.video_track_count,
        );

        if let Some(video) = &metadata.video {
            log::debug!(
                "First video track: index={}, {}x{}, {:.2} fps, codec={}, rotation={}°",
                video.stream_index,
                video.width,
                video.height,
                video.frames_per_second,
                video.codec,
                video.orientation.rotation.degrees(),
            );
        }

        Ok(Self {
            input_context,
            metadata,
            file_path,
        })
    }

    /// Get a reference to the cached metadata.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Metadata of the first video track.
    ///
    /// # Errors
    ///
    /// Returns [`FrameBarError::NoVideoStream`] if the file has no video.
    pub fn video_metadata(&self) -> Result<&VideoMetadata, FrameBarError> {
        self.metadata.video.as_ref().ok_or(FrameBarError::NoVideoStream)
    }

    /// Path this file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Container duration, falling back to the video track's own duration.
/// Video streams that carry real frames. Cover art (an MP4 `covr` atom or
/// an ID3 APIC image) is exposed as a one-packet video stream flagged
/// `ATTACHED_PIC` and does not count as a track.
fn is_video_track(stream: &Stream<'_>) -> bool {
    stream.parameters().medium() == Type::Video
        && !stream.disposition().contains(Disposition::ATTACHED_PIC)
}

fn container_duration(input_context: &Input, video: Option<&VideoMetadata>) -> Duration {
    let duration_microseconds = input_context.duration();
    if duration_microseconds > 0 {
        return Duration::from_micros(duration_microseconds as u64);
    }

    video
        .and_then(|video| {
            let stream = input_context.stream(video.stream_index)?;
            let stream_duration = stream.duration();
            (stream_duration > 0)
                .then(|| Timestamp::from_pts(stream_duration, video.time_base).as_duration())
        })
        .unwrap_or(Duration::ZERO)
}
