//! Key-frame scanning.
//!
//! Walks the demuxed packets of the first video track and records the
//! presentation timestamp of every packet flagged as a key frame. Packets are
//! never sent to a decoder, so the cost of a scan grows with the packet
//! count, not with decode work.
//!
//! # Example
//!
//! ```no_run
//! use framebar::{FrameBarError, VideoFile, scan_key_frames};
//!
//! let mut file = VideoFile::open("input.mp4")?;
//! let key_frames = scan_key_frames(&mut file)?;
//! println!("{} key frames in {} packets", key_frames.len(), key_frames.video_packets);
//! # Ok::<(), FrameBarError>(())
//! ```

use ffmpeg_next::{Error as FfmpegError, Packet};

use crate::configuration::{CallBudget, ExtractOptions};
use crate::error::FrameBarError;
use crate::progress::{OperationType, ProgressTracker};
use crate::timestamp::Timestamp;
use crate::video_file::VideoFile;

/// How many packets to read between cancellation checks.
const CANCELLATION_CHECK_INTERVAL: u64 = 256;

/// Ordered key-frame timestamps of one video track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFrameSet {
    /// Key-frame presentation timestamps, ascending.
    pub timestamps: Vec<Timestamp>,
    /// Total number of video packets read during the scan.
    pub video_packets: u64,
}

impl KeyFrameSet {
    /// Number of key frames.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Returns `true` if no key frame was found.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Scan the first video track of `file` for key frames.
///
/// # Errors
///
/// Returns [`FrameBarError::NoVideoStream`] if the file has no video track,
/// or an FFmpeg error if a packet cannot be read.
pub fn scan_key_frames(file: &mut VideoFile) -> Result<KeyFrameSet, FrameBarError> {
    scan_key_frames_with_options(file, &ExtractOptions::default())
}

/// Scan for key frames with progress and cancellation support.
///
/// Like [`scan_key_frames`], but reports one progress item per key frame
/// and stops with [`FrameBarError::Cancelled`] or
/// [`FrameBarError::DeadlineExceeded`] when the options ask for it.
pub fn scan_key_frames_with_options(
    file: &mut VideoFile,
    options: &ExtractOptions,
) -> Result<KeyFrameSet, FrameBarError> {
    scan_key_frames_impl(file, options, &options.start_call())
}

pub(crate) fn scan_key_frames_impl(
    file: &mut VideoFile,
    options: &ExtractOptions,
    budget: &CallBudget,
) -> Result<KeyFrameSet, FrameBarError> {
    let video = file.video_metadata()?;
    let video_stream_index = video.stream_index;
    let time_base = video.time_base;

    log::debug!("Scanning key frames (stream={})", video_stream_index);

    let tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::KeyFrameScan,
        None,
        options.batch_size,
    );

    let mut timestamps: Vec<Timestamp> = Vec::new();
    let mut video_packets: u64 = 0;
    let mut packet = Packet::empty();

    loop {
        match packet.read(&mut file.input_context) {
            Ok(()) => {
                if packet.stream() != video_stream_index {
                    continue;
                }
                video_packets += 1;

                if video_packets % CANCELLATION_CHECK_INTERVAL == 0 {
                    budget.check()?;
                }

                if !packet.is_key() {
                    continue;
                }

                let Some(pts) = packet.pts().or_else(|| packet.dts()) else {
                    log::debug!("Skipping key frame without timestamps");
                    continue;
                };

                let timestamp = Timestamp::from_pts(pts, time_base).max_zero();
                timestamps.push(timestamp);
                tracker.advance(Some(timestamp));
            }
            Err(FfmpegError::Eof) => break,
            Err(error) => return Err(FrameBarError::from(error)),
        }
    }

    // Key frames come out of the demuxer in presentation order for every
    // mainstream container; open-GOP streams can still carry a stray
    // out-of-order PTS.
    if !timestamps.is_sorted() {
        log::debug!("Key frames arrived out of order, sorting");
        timestamps.sort();
    }
    timestamps.dedup();

    tracker.finish();

    log::debug!(
        "Found {} key frames in {} video packets",
        timestamps.len(),
        video_packets
    );

    Ok(KeyFrameSet {
        timestamps,
        video_packets,
    })
}
