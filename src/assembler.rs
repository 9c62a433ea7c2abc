//! Ordered collection of rendered frames.
//!
//! Renders finish in whatever order the thread pool schedules them. The
//! assembler gives every selected timestamp its own slot, keyed by selection
//! index, and only imposes order when the results are read back.

use std::sync::OnceLock;

use crate::timestamp::Timestamp;

/// The outcome of rendering one selected timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    /// Position in the selection, `0..selection.len()`.
    pub index: usize,
    /// Timestamp the frame was requested at.
    pub timestamp: Timestamp,
    /// Compressed image, absent if rendering failed.
    pub image_bytes: Option<Vec<u8>>,
}

/// Fixed-size, write-once result slots.
///
/// Safe to share by reference across threads: each slot is a
/// [`OnceLock`], so writers to different slots never contend.
///
/// ```
/// use framebar::{OrderedAssembler, RenderedFrame, Timestamp};
///
/// let assembler = OrderedAssembler::new(3);
/// assembler.record(RenderedFrame { index: 2, timestamp: Timestamp::from_millis(2000), image_bytes: Some(vec![2]) });
/// assembler.record(RenderedFrame { index: 1, timestamp: Timestamp::from_millis(1000), image_bytes: None });
/// assembler.record(RenderedFrame { index: 0, timestamp: Timestamp::ZERO, image_bytes: Some(vec![0]) });
/// assert_eq!(assembler.finish(), vec![vec![0], vec![2]]);
/// ```
#[derive(Debug)]
pub struct OrderedAssembler {
    slots: Vec<OnceLock<Vec<u8>>>,
}

impl OrderedAssembler {
    /// Create an assembler with `len` empty slots.
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the assembler has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots that hold an image.
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }

    /// Store a rendered frame in its slot.
    ///
    /// Returns `true` if the bytes were stored. Frames without bytes, frames
    /// whose index is out of range and second writes to a slot are dropped.
    pub fn record(&self, frame: RenderedFrame) -> bool {
        let Some(bytes) = frame.image_bytes else {
            return false;
        };
        let Some(slot) = self.slots.get(frame.index) else {
            log::warn!(
                "Dropping frame {} at {}: only {} slots",
                frame.index,
                frame.timestamp,
                self.slots.len()
            );
            return false;
        };
        if slot.set(bytes).is_err() {
            log::warn!(
                "Slot {} already filled, ignoring frame at {}",
                frame.index,
                frame.timestamp
            );
            return false;
        }
        true
    }

    /// Filled slots in index order. Empty slots are skipped, not padded.
    pub fn finish(self) -> Vec<Vec<u8>> {
        self.slots
            .into_iter()
            .filter_map(OnceLock::into_inner)
            .collect()
    }
}
