//! Extraction configuration.
//!
//! [`ExtractOptions`] is a builder that threads output settings, progress
//! callbacks, cancellation tokens and deadlines through the pipeline without
//! polluting every function signature. The defaults reproduce scrubber-bar
//! previews: at most 640×360 and very aggressive JPEG compression.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use framebar::{CancellationToken, ExtractOptions};
//!
//! let token = CancellationToken::new();
//! let options = ExtractOptions::new()
//!     .with_max_size(320, 180)
//!     .with_quality(30)
//!     .with_cancellation(token.clone())
//!     .with_deadline(Duration::from_secs(5));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::FrameBarError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Default bounding box width for rendered thumbnails.
pub const DEFAULT_MAX_WIDTH: u32 = 640;
/// Default bounding box height for rendered thumbnails.
pub const DEFAULT_MAX_HEIGHT: u32 = 360;
/// Default JPEG quality (1–100). Deliberately tiny: previews only.
pub const DEFAULT_JPEG_QUALITY: u8 = 5;

/// Configuration for extraction calls.
#[derive(Clone)]
pub struct ExtractOptions {
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// Fire the progress callback every N items.
    pub(crate) batch_size: u64,
    /// Bounding box width; frames are scaled down to fit, never up.
    pub(crate) max_width: u32,
    /// Bounding box height.
    pub(crate) max_height: u32,
    /// JPEG quality, 1–100.
    pub(crate) quality: u8,
    /// Wall-clock budget for a whole call.
    pub(crate) deadline: Option<Duration>,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("max_width", &self.max_width)
            .field("max_height", &self.max_height)
            .field("quality", &self.quality)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with the default settings: 640×360, quality 5, no
    /// progress callback, no cancellation, no deadline.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_JPEG_QUALITY,
            deadline: None,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the bounding box rendered frames must fit in. Each side is
    /// clamped to at least one pixel.
    #[must_use]
    pub fn with_max_size(mut self, width: u32, height: u32) -> Self {
        self.max_width = width.max(1);
        self.max_height = height.max(1);
        self
    }

    /// Set the JPEG quality, clamped to 1–100.
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Give every call a wall-clock budget. Render units that would start
    /// after the budget is spent are skipped and the call fails with
    /// [`FrameBarError::DeadlineExceeded`].
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Bounding box as `(width, height)`.
    pub fn max_size(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }

    /// JPEG quality.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Start the clock for one call.
    pub(crate) fn start_call(&self) -> CallBudget {
        CallBudget {
            cancellation: self.cancellation.clone(),
            deadline: self.deadline.map(|budget| (Instant::now() + budget, budget)),
        }
    }
}

/// Cancellation and deadline state of one call.
#[derive(Debug, Clone)]
pub(crate) struct CallBudget {
    cancellation: Option<CancellationToken>,
    deadline: Option<(Instant, Duration)>,
}

impl CallBudget {
    /// Fail if the call was cancelled or ran out of time.
    pub(crate) fn check(&self) -> Result<(), FrameBarError> {
        if self
            .cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
        {
            return Err(FrameBarError::Cancelled);
        }
        match self.deadline {
            Some((expires, budget)) if Instant::now() >= expires => {
                Err(FrameBarError::DeadlineExceeded(budget))
            }
            _ => Ok(()),
        }
    }
}
