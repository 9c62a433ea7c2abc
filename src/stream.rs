//! Future entry points for async callers.
//!
//! Extraction is CPU-heavy FFmpeg work, so it runs on Tokio's blocking pool
//! via `tokio::task::spawn_blocking`. The returned [`FramesFuture`] only
//! waits on the join handle; rendering itself still fans out over rayon.
//!
//! # Example
//!
//! ```no_run
//! use framebar::{FrameBarError, FrameExtractor, KeyFrameRequest};
//!
//! # async fn example() -> Result<(), FrameBarError> {
//! let extractor = FrameExtractor::default();
//! let thumbnails = extractor
//!     .key_frames_async(KeyFrameRequest::new("input.mp4").with_frame_interval(1000))
//!     .await?;
//! println!("Got {} thumbnails", thumbnails.len());
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::error::FrameBarError;

/// A future that resolves to the JPEG thumbnails of one extraction call.
///
/// Created by [`FrameExtractor::key_frames_async`](crate::FrameExtractor::key_frames_async)
/// and [`FrameExtractor::first_frame_async`](crate::FrameExtractor::first_frame_async).
/// Dropping the future does not stop the background work; use a
/// [`CancellationToken`](crate::CancellationToken) for that.
pub struct FramesFuture {
    handle: JoinHandle<Result<Vec<Vec<u8>>, FrameBarError>>,
}

impl Future for FramesFuture {
    type Output = Result<Vec<Vec<u8>>, FrameBarError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| Err(FrameBarError::Cancelled)))
    }
}

/// Run `work` on Tokio's blocking pool.
pub(crate) fn spawn_frames<F>(work: F) -> FramesFuture
where
    F: FnOnce() -> Result<Vec<Vec<u8>>, FrameBarError> + Send + 'static,
{
    FramesFuture {
        handle: tokio::task::spawn_blocking(work),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_to_worker_result() {
        let images = spawn_frames(|| Ok(vec![vec![1, 2, 3]])).await.expect("ok");
        assert_eq!(images, vec![vec![1, 2, 3]]);
    }

    #[tokio::test]
    async fn worker_panic_maps_to_cancelled() {
        let result = spawn_frames(|| panic!("worker died")).await;
        assert!(matches!(result, Err(FrameBarError::Cancelled)));
    }
}
