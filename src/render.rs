//! Still-frame rendering.
//!
//! [`FrameRenderer`] decodes the single frame whose presentation timestamp
//! equals a requested [`Timestamp`] exactly, scales it to fit a bounding
//! box, applies the track's display orientation and optionally compresses
//! it to JPEG. A renderer owns its own demuxer and decoder, so one renderer
//! per worker thread is the intended use.

use std::path::Path;

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{
    compression::compress_jpeg,
    configuration::ExtractOptions,
    error::FrameBarError,
    metadata::VideoMetadata,
    timestamp::Timestamp,
    video_file::VideoFile,
};

/// Renders exact-timestamp stills from one video file.
///
/// # Example
///
/// ```no_run
/// use framebar::{ExtractOptions, FrameBarError, FrameRenderer, Timestamp};
///
/// let mut renderer = FrameRenderer::open("input.mp4", &ExtractOptions::default())?;
/// let jpeg = renderer.render_jpeg(Timestamp::from_millis(2000))?;
/// std::fs::write("two_seconds.jpg", jpeg)?;
/// # Ok::<(), FrameBarError>(())
/// ```
#[derive(Debug)]
pub struct FrameRenderer {
    file: VideoFile,
    max_width: u32,
    max_height: u32,
    quality: u8,
}

/// What to do with a frame that came out of the decoder.
enum Verdict {
    /// Still before the target, keep decoding.
    Before,
    /// The requested frame.
    Hit,
    /// Decoding went past the target without an exact match.
    Past,
}

impl FrameRenderer {
    /// Open `path` and build a renderer using the bounding box and quality
    /// from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameBarError::FileOpen`] if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, options: &ExtractOptions) -> Result<Self, FrameBarError> {
        Ok(Self::from_file(VideoFile::open(path)?, options))
    }

    /// Build a renderer around an already opened file.
    pub fn from_file(file: VideoFile, options: &ExtractOptions) -> Self {
        let (max_width, max_height) = options.max_size();
        Self {
            file,
            max_width,
            max_height,
            quality: options.quality(),
        }
    }

    /// The underlying file.
    pub fn video_file(&self) -> &VideoFile {
        &self.file
    }

    /// Render the frame at exactly `timestamp` and compress it to JPEG.
    ///
    /// # Errors
    ///
    /// Same as [`render`](FrameRenderer::render), plus
    /// [`FrameBarError::ImageEncodeError`] if compression fails.
    pub fn render_jpeg(&mut self, timestamp: Timestamp) -> Result<Vec<u8>, FrameBarError> {
        let image = self.render(timestamp)?;
        compress_jpeg(&image, self.quality)
    }

    /// Render the frame at exactly `timestamp`, scaled and oriented.
    ///
    /// Seeks to the closest key frame at or before `timestamp` and decodes
    /// forward. No neighbouring frame is ever substituted.
    ///
    /// # Errors
    ///
    /// - [`FrameBarError::NoVideoStream`] if the file has no video.
    /// - [`FrameBarError::FrameNotFound`] if no decoded frame carries
    ///   exactly `timestamp` (including timestamps past the end).
    /// - FFmpeg errors from seeking, decoding or scaling.
    pub fn render(&mut self, timestamp: Timestamp) -> Result<DynamicImage, FrameBarError> {
        let video = self.file.video_metadata()?.clone();

        let stream = self
            .file
            .input_context
            .stream(video.stream_index)
            .ok_or(FrameBarError::NoVideoStream)?;
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().video()?;

        // Container-level seek takes AV_TIME_BASE (microsecond) units.
        let seek_target = timestamp.as_duration().as_micros().min(i64::MAX as u128) as i64;
        self.file.input_context.seek(seek_target, ..seek_target)?;

        let bounds = (self.max_width, self.max_height);
        let mut decoded_frame = VideoFrame::empty();

        for (stream, packet) in self.file.input_context.packets() {
            if stream.index() != video.stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;
            if let Some(image) = drain(&mut decoder, &mut decoded_frame, &video, timestamp, bounds)? {
                return Ok(image);
            }
        }

        decoder.send_eof()?;
        if let Some(image) = drain(&mut decoder, &mut decoded_frame, &video, timestamp, bounds)? {
            return Ok(image);
        }

        Err(FrameBarError::FrameNotFound(timestamp))
    }
}

/// Pull every frame the decoder has ready and act on the first hit.
fn drain(
    decoder: &mut VideoDecoder,
    decoded_frame: &mut VideoFrame,
    video: &VideoMetadata,
    target: Timestamp,
    bounds: (u32, u32),
) -> Result<Option<DynamicImage>, FrameBarError> {
    while decoder.receive_frame(decoded_frame).is_ok() {
        let Some(pts) = decoded_frame.timestamp().or_else(|| decoded_frame.pts()) else {
            continue;
        };
        let current = Timestamp::from_pts(pts, video.time_base).max_zero();

        match compare(current, target) {
            Verdict::Before => continue,
            Verdict::Hit => return convert(decoded_frame, video, bounds).map(Some),
            Verdict::Past => {
                log::debug!("Decoder reached {current} without a frame at {target}");
                return Err(FrameBarError::FrameNotFound(target));
            }
        }
    }
    Ok(None)
}

/// Scale a decoded frame into the bounding box and orient it.
fn convert(
    decoded_frame: &VideoFrame,
    video: &VideoMetadata,
    (max_width, max_height): (u32, u32),
) -> Result<DynamicImage, FrameBarError> {
    let (source_width, source_height) = (decoded_frame.width(), decoded_frame.height());
    let (display_width, display_height) = video
        .orientation
        .display_dimensions(source_width, source_height);
    let (fitted_width, fitted_height) =
        fit_within(display_width, display_height, max_width, max_height);
    // Scale in coded orientation; the rotation happens afterwards.
    let (target_width, target_height) = video
        .orientation
        .display_dimensions(fitted_width, fitted_height);

    let mut scaler = ScalingContext::get(
        decoded_frame.format(),
        source_width,
        source_height,
        Pixel::RGB24,
        target_width,
        target_height,
        ScalingFlags::BILINEAR,
    )?;
    let mut rgb_frame = VideoFrame::empty();
    scaler.run(decoded_frame, &mut rgb_frame)?;

    let buffer = frame_to_rgb_buffer(&rgb_frame, target_width, target_height);
    let rgb_image = RgbImage::from_raw(target_width, target_height, buffer).ok_or_else(|| {
        FrameBarError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;

    Ok(video.orientation.apply(DynamicImage::ImageRgb8(rgb_image)))
}

fn compare(current: Timestamp, target: Timestamp) -> Verdict {
    match current.cmp(&target) {
        std::cmp::Ordering::Less => Verdict::Before,
        std::cmp::Ordering::Equal => Verdict::Hit,
        std::cmp::Ordering::Greater => Verdict::Past,
    }
}

/// Scale `width` × `height` down to fit inside `max_width` × `max_height`,
/// preserving aspect ratio. Frames that already fit are left alone.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (max_width.max(1), max_height.max(1));
    }
    let scale = (max_width as f64 / width as f64)
        .min(max_height as f64 / height as f64)
        .min(1.0);
    let fitted_width = ((width as f64) * scale).round() as u32;
    let fitted_height = ((height as f64) * scale).round() as u32;
    (
        fitted_width.clamp(1, max_width.max(1)),
        fitted_height.clamp(1, max_height.max(1)),
    )
}

/// Copy an RGB24 frame into a tightly packed buffer, dropping row padding.
fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_length {
        data[..row_length * (height as usize)].to_vec()
    } else {
        data.chunks(stride)
            .take(height as usize)
            .flat_map(|row| &row[..row_length])
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_fits_box_exactly() {
        assert_eq!(fit_within(1920, 1080, 640, 360), (640, 360));
    }

    #[test]
    fn portrait_is_bounded_by_height() {
        assert_eq!(fit_within(1080, 1920, 640, 360), (203, 360));
    }

    #[test]
    fn small_frames_are_not_upscaled() {
        assert_eq!(fit_within(320, 240, 640, 360), (320, 240));
    }

    #[test]
    fn ultra_wide_never_collapses() {
        let (width, height) = fit_within(10_000, 10, 640, 360);
        assert_eq!(width, 640);
        assert_eq!(height, 1);
    }

    #[test]
    fn unknown_dimensions_use_box() {
        assert_eq!(fit_within(0, 0, 640, 360), (640, 360));
    }

    #[test]
    fn verdicts_follow_timestamp_order() {
        let target = Timestamp::from_millis(500);
        assert!(matches!(compare(Timestamp::ZERO, target), Verdict::Before));
        assert!(matches!(compare(Timestamp::new(1, 2), target), Verdict::Hit));
        assert!(matches!(compare(Timestamp::from_millis(501), target), Verdict::Past));
    }
}
