//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring extraction
//! progress, [`CancellationToken`] for cooperative cancellation, and
//! [`ProgressInfo`] for progress snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framebar::{
//!     ExtractOptions, FrameBarError, FrameExtractor, KeyFrameRequest, ProgressCallback,
//!     ProgressInfo,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(percentage) = info.percentage {
//!             println!("[{:?}] {percentage:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! let extractor = FrameExtractor::new(options);
//! let frames = extractor.key_frames(&KeyFrameRequest::new("input.mp4").with_frame_count(10))?;
//! # Ok::<(), FrameBarError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::time::{Duration, Instant};

use crate::timestamp::Timestamp;

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Reading packets to find key frames.
    KeyFrameScan,
    /// Rendering and compressing selected key frames.
    FrameRendering,
    /// Rendering the first frame.
    FirstFrame,
}

/// A snapshot of extraction progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled
/// by [`ExtractOptions::with_batch_size`](crate::ExtractOptions::with_batch_size).
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many items have completed so far.
    pub current: u64,
    /// Total items expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// Timestamp of the item that triggered this report.
    pub current_timestamp: Option<Timestamp>,
}

/// Trait for receiving progress updates.
///
/// Implementations must be [`Send`] and [`Sync`]: frame rendering reports
/// from rayon worker threads, in completion order.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during an operation.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone the token and call [`cancel`](CancellationToken::cancel) from any
/// thread. Render units that have not started yet are skipped and the call
/// fails with [`FrameBarError::Cancelled`](crate::FrameBarError::Cancelled).
///
/// ```
/// use framebar::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
/// token.clone().cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks completed items and emits callbacks.
///
/// Shared by reference between rayon workers, so the counters are atomic.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: AtomicU64,
    batch_size: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: AtomicU64::new(0),
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
        }
    }

    /// Record one completed item, reporting every `batch_size` items.
    pub(crate) fn advance(&self, timestamp: Option<Timestamp>) {
        let current = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        if current % self.batch_size == 0 {
            self.report(current, timestamp);
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&self) {
        self.report(self.current.load(Ordering::Acquire), None);
    }

    fn report(&self, current: u64, timestamp: Option<Timestamp>) {
        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (current as f32 / total as f32) * 100.0);

        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
            current_timestamp: timestamp,
        });
    }
}
