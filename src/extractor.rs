//! The extraction pipeline.
//!
//! [`FrameExtractor`] composes scanning, planning, selection, parallel
//! rendering and ordered assembly into one call. Every call is independent:
//! files are opened per call (and per render worker), and nothing is cached
//! between calls.
//!
//! Three call shapes are offered for both operations:
//!
//! - blocking ([`key_frames`](FrameExtractor::key_frames),
//!   [`first_frame`](FrameExtractor::first_frame)),
//! - fire-and-forget with a completion callback that is invoked exactly once
//!   ([`key_frames_with_callback`](FrameExtractor::key_frames_with_callback)),
//! - futures, behind the `async` feature.
//!
//! # Example
//!
//! ```no_run
//! use framebar::{ExtractOptions, FrameBarError, FrameExtractor, KeyFrameRequest};
//!
//! let extractor = FrameExtractor::new(ExtractOptions::new());
//! let request = KeyFrameRequest::new("input.mp4")
//!     .with_frame_count(10)
//!     .with_skip_first_frame(true);
//!
//! for (index, jpeg) in extractor.key_frames(&request)?.iter().enumerate() {
//!     std::fs::write(format!("thumb_{index:02}.jpg"), jpeg)?;
//! }
//! # Ok::<(), FrameBarError>(())
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::ParallelSlice;

use crate::assembler::{OrderedAssembler, RenderedFrame};
use crate::configuration::{CallBudget, ExtractOptions};
use crate::error::FrameBarError;
use crate::keyframe::scan_key_frames_impl;
use crate::planner::SelectionPlan;
use crate::progress::{OperationType, ProgressTracker};
use crate::render::FrameRenderer;
use crate::selector::select_frames;
use crate::timestamp::Timestamp;
use crate::video_file::VideoFile;

/// Parameters of one key-frame extraction call.
///
/// Non-positive counts and intervals are accepted and mean "not given".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFrameRequest {
    pub(crate) path: PathBuf,
    pub(crate) frame_count: Option<i64>,
    pub(crate) frame_interval_ms: Option<i64>,
    pub(crate) skip_first_frame: bool,
}

impl KeyFrameRequest {
    /// Request every key frame of the video at `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            frame_count: None,
            frame_interval_ms: None,
            skip_first_frame: false,
        }
    }

    /// Return at most `count` frames.
    #[must_use]
    pub fn with_frame_count(mut self, count: i64) -> Self {
        self.frame_count = Some(count);
        self
    }

    /// Aim for one frame every `interval_ms` milliseconds of video.
    #[must_use]
    pub fn with_frame_interval(mut self, interval_ms: i64) -> Self {
        self.frame_interval_ms = Some(interval_ms);
        self
    }

    /// Drop the earliest selected frame.
    #[must_use]
    pub fn with_skip_first_frame(mut self, skip: bool) -> Self {
        self.skip_first_frame = skip;
        self
    }

    /// Path of the video.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Requested frame cap, if any.
    pub fn frame_count(&self) -> Option<i64> {
        self.frame_count
    }

    /// Requested interval in milliseconds, if any.
    pub fn frame_interval_ms(&self) -> Option<i64> {
        self.frame_interval_ms
    }

    /// Whether the first selected frame is dropped.
    pub fn skip_first_frame(&self) -> bool {
        self.skip_first_frame
    }
}

/// Runs extraction calls with a fixed set of [`ExtractOptions`].
#[derive(Debug, Clone, Default)]
pub struct FrameExtractor {
    options: ExtractOptions,
}

impl FrameExtractor {
    /// Create an extractor.
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// The options every call runs with.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract evenly spaced key-frame thumbnails, ascending by time.
    ///
    /// Frames that fail to render are left out, so the result may be
    /// shorter than the planned count. A video without key frames yields an
    /// empty vector.
    ///
    /// # Errors
    ///
    /// - [`FrameBarError::FileOpen`] / [`FrameBarError::NoVideoStream`] if
    ///   the file cannot be used at all.
    /// - [`FrameBarError::Ffmpeg`] if the packet scan fails.
    /// - [`FrameBarError::Cancelled`] / [`FrameBarError::DeadlineExceeded`]
    ///   if the call was interrupted.
    pub fn key_frames(&self, request: &KeyFrameRequest) -> Result<Vec<Vec<u8>>, FrameBarError> {
        let started = Instant::now();
        let budget = self.options.start_call();

        let mut file = VideoFile::open(&request.path)?;
        let key_frames = scan_key_frames_impl(&mut file, &self.options, &budget)?;
        if key_frames.is_empty() {
            log::info!("No key frames in {}", request.path.display());
            return Ok(Vec::new());
        }

        let plan = SelectionPlan::new(
            key_frames.len(),
            request.frame_count,
            request.frame_interval_ms,
            file.metadata().duration,
            request.skip_first_frame,
        );
        let selected = select_frames(&key_frames.timestamps, &plan);
        // Workers open their own demuxers; the scan handle is not reused.
        drop(file);

        let images = self.render_all(&request.path, &selected, &budget)?;

        log::info!(
            "Extracted {}/{} key frames from {} in {:.3}s",
            images.len(),
            selected.len(),
            request.path.display(),
            started.elapsed().as_secs_f64()
        );
        Ok(images)
    }

    /// Render the first frame of the video.
    ///
    /// "First" means the stream's first presentation timestamp, clamped to
    /// zero. Returns a one-element vector.
    ///
    /// # Errors
    ///
    /// Any failure, including failure to render the frame itself.
    pub fn first_frame<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Vec<u8>>, FrameBarError> {
        let started = Instant::now();
        let path = path.as_ref();
        let budget = self.options.start_call();
        budget.check()?;

        let tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::FirstFrame,
            Some(1),
            1,
        );

        let mut renderer = FrameRenderer::open(path, &self.options)?;
        let start_time = renderer.video_file().video_metadata()?.start_time.max_zero();
        let bytes = renderer.render_jpeg(start_time)?;
        tracker.advance(Some(start_time));

        log::info!(
            "Extracted first frame ({start_time}) from {} in {:.3}s",
            path.display(),
            started.elapsed().as_secs_f64()
        );
        Ok(vec![bytes])
    }

    /// Run [`key_frames`](FrameExtractor::key_frames) on the rayon pool and
    /// hand the outcome to `callback`.
    ///
    /// Returns immediately. `callback` runs exactly once, on a pool thread,
    /// with `None` if the call failed as a whole.
    pub fn key_frames_with_callback<F>(&self, request: KeyFrameRequest, callback: F)
    where
        F: FnOnce(Option<Vec<Vec<u8>>>) + Send + 'static,
    {
        let extractor = self.clone();
        rayon::spawn(move || {
            let reply = guarded_reply(&request.path, || extractor.key_frames(&request));
            callback(reply);
        });
    }

    /// Callback form of [`first_frame`](FrameExtractor::first_frame).
    pub fn first_frame_with_callback<P, F>(&self, path: P, callback: F)
    where
        P: Into<PathBuf>,
        F: FnOnce(Option<Vec<Vec<u8>>>) + Send + 'static,
    {
        let extractor = self.clone();
        let path = path.into();
        rayon::spawn(move || {
            let reply = guarded_reply(&path, || extractor.first_frame(&path));
            callback(reply);
        });
    }

    /// Future form of [`key_frames`](FrameExtractor::key_frames).
    ///
    /// Must be called from within a Tokio runtime.
    #[cfg(feature = "async")]
    pub fn key_frames_async(&self, request: KeyFrameRequest) -> crate::stream::FramesFuture {
        let extractor = self.clone();
        crate::stream::spawn_frames(move || extractor.key_frames(&request))
    }

    /// Future form of [`first_frame`](FrameExtractor::first_frame).
    ///
    /// Must be called from within a Tokio runtime.
    #[cfg(feature = "async")]
    pub fn first_frame_async<P: Into<PathBuf>>(&self, path: P) -> crate::stream::FramesFuture {
        let extractor = self.clone();
        let path = path.into();
        crate::stream::spawn_frames(move || extractor.first_frame(&path))
    }

    /// Fan the selection out over the rayon pool and collect in order.
    fn render_all(
        &self,
        path: &Path,
        selected: &[Timestamp],
        budget: &CallBudget,
    ) -> Result<Vec<Vec<u8>>, FrameBarError> {
        let assembler = OrderedAssembler::new(selected.len());
        let tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::FrameRendering,
            Some(selected.len() as u64),
            self.options.batch_size,
        );
        let interruption: OnceLock<FrameBarError> = OnceLock::new();

        let chunk_size = render_chunk_size(selected.len(), rayon::current_num_threads());
        selected
            .par_chunks(chunk_size)
            .enumerate()
            .for_each(|(chunk_index, chunk)| {
                if let Err(error) = budget.check() {
                    let _ = interruption.set(error);
                    return;
                }

                // One demuxer per chunk; timestamps within a chunk ascend.
                let mut renderer = FrameRenderer::open(path, &self.options);
                if let Err(error) = &renderer {
                    log::warn!("Render worker could not open {}: {error}", path.display());
                }

                for (offset, &timestamp) in chunk.iter().enumerate() {
                    if let Err(error) = budget.check() {
                        let _ = interruption.set(error);
                        return;
                    }

                    let index = chunk_index * chunk_size + offset;
                    let image_bytes = match &mut renderer {
                        Ok(renderer) => match renderer.render_jpeg(timestamp) {
                            Ok(bytes) => Some(bytes),
                            Err(error) => {
                                log_render_failure(index, timestamp, &error);
                                None
                            }
                        },
                        Err(_) => None,
                    };

                    assembler.record(RenderedFrame {
                        index,
                        timestamp,
                        image_bytes,
                    });
                    tracker.advance(Some(timestamp));
                }
            });

        tracker.finish();

        if let Some(error) = interruption.into_inner() {
            log::info!("Extraction of {} stopped: {error}", path.display());
            return Err(error);
        }

        Ok(assembler.finish())
    }
}

/// Split `len` render units into one contiguous chunk per pool thread.
fn render_chunk_size(len: usize, threads: usize) -> usize {
    len.div_ceil(threads.max(1)).max(1)
}

fn log_render_failure(index: usize, timestamp: Timestamp, error: &FrameBarError) {
    match error {
        FrameBarError::FrameNotFound(_) => {
            log::debug!("Skipping frame {index}: {error}");
        }
        _ => log::warn!("Skipping frame {index} at {timestamp}: {error}"),
    }
}

/// Collapse a call result into the shape callbacks receive.
pub(crate) fn into_reply(
    result: Result<Vec<Vec<u8>>, FrameBarError>,
    path: &Path,
) -> Option<Vec<Vec<u8>>> {
    match result {
        Ok(images) => Some(images),
        Err(error) => {
            log::warn!("Extraction from {} failed: {error}", path.display());
            None
        }
    }
}

/// Run `work` on a pool thread, turning a panic into a failed reply.
///
/// An unwinding rayon job aborts the process, which would also skip the
/// callback.
fn guarded_reply<F>(path: &Path, work: F) -> Option<Vec<Vec<u8>>>
where
    F: FnOnce() -> Result<Vec<Vec<u8>>, FrameBarError>,
{
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(result) => into_reply(result, path),
        Err(_) => {
            log::error!("Extraction from {} panicked", path.display());
            None
        }
    }
}
