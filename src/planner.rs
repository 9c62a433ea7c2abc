//! Target frame count planning.
//!
//! Two call patterns exist: callers that ask for "at most N frames" and
//! callers that ask for "one frame every T milliseconds". Both resolve to a
//! single [`SelectionPlan`] here, so the selector only ever sees a count.

use std::time::Duration;

/// How many key frames to keep and whether to drop the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPlan {
    /// Number of timestamps to select.
    pub target_count: usize,
    /// Drop the first selected timestamp after down-sampling.
    pub skip_first: bool,
}

/// Compute the number of frames to select.
///
/// Rules, applied in order:
///
/// 1. Start from `key_frame_count`.
/// 2. A positive `frame_interval_ms` replaces it with
///    `floor(duration_ms / frame_interval_ms)`.
/// 3. A positive `frame_count` caps the current value.
/// 4. A result of zero falls back to `key_frame_count`.
///
/// Non-positive `frame_count` or `frame_interval_ms` values are ignored.
///
/// ```
/// use std::time::Duration;
///
/// use framebar::plan_target_count;
///
/// let ten_seconds = Duration::from_secs(10);
/// assert_eq!(plan_target_count(40, None, Some(500), ten_seconds), 20);
/// assert_eq!(plan_target_count(40, Some(5), Some(500), ten_seconds), 5);
/// assert_eq!(plan_target_count(40, None, None, ten_seconds), 40);
/// ```
pub fn plan_target_count(
    key_frame_count: usize,
    frame_count: Option<i64>,
    frame_interval_ms: Option<i64>,
    duration: Duration,
) -> usize {
    let mut target = key_frame_count as u128;

    if let Some(interval) = frame_interval_ms.filter(|&interval| interval > 0) {
        target = duration.as_millis() / interval as u128;
    }

    if let Some(cap) = frame_count.filter(|&count| count > 0) {
        target = target.min(cap as u128);
    }

    if target == 0 {
        return key_frame_count;
    }

    target.min(usize::MAX as u128) as usize
}

impl SelectionPlan {
    /// Build a plan with [`plan_target_count`].
    pub fn new(
        key_frame_count: usize,
        frame_count: Option<i64>,
        frame_interval_ms: Option<i64>,
        duration: Duration,
        skip_first: bool,
    ) -> Self {
        let target_count =
            plan_target_count(key_frame_count, frame_count, frame_interval_ms, duration);
        log::debug!(
            "Planned {} of {} key frames (frame_count={:?}, interval_ms={:?}, duration={:.3}s, skip_first={})",
            target_count,
            key_frame_count,
            frame_count,
            frame_interval_ms,
            duration.as_secs_f64(),
            skip_first,
        );
        Self {
            target_count,
            skip_first,
        }
    }
}
