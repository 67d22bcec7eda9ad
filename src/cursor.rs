//! Frame index bookkeeping over a [`FormatAdapter`].
//!
//! [`StreamCursor`] owns the adapter and the single piece of mutable state a
//! session carries: the index of the frame the next decode will produce.
//! Every seek is validated against the track metadata before the adapter is
//! touched, so a rejected seek never moves the cursor.

use crate::{
    adapter::FormatAdapter, container::ContainerFormat, error::FrameGrabError,
    metadata::VideoStreamMetadata, picture::NativePicture,
};

/// Tracks the current frame index of one video track.
///
/// The index stays in `0..=total_frames`; it equals `total_frames` only once
/// the stream has been decoded to the end.
#[derive(Debug)]
pub struct StreamCursor<A> {
    adapter: A,
    metadata: VideoStreamMetadata,
    current_index: u64,
    /// Set when the adapter's read position no longer matches
    /// `current_index`, e.g. after a failed decode.
    needs_resync: bool,
}

impl<A: FormatAdapter> StreamCursor<A> {
    /// Wrap an opened adapter, positioned at frame 0.
    pub fn new(adapter: A) -> Self {
        let metadata = adapter.metadata();
        log::debug!(
            "Opened {} track: {} frames, {}x{}, {:.3}s",
            adapter.format(),
            metadata.total_frames,
            metadata.width,
            metadata.height,
            metadata.duration_seconds
        );
        Self {
            adapter,
            metadata,
            current_index: 0,
            needs_resync: false,
        }
    }

    /// Track metadata captured when the cursor was created.
    pub fn metadata(&self) -> VideoStreamMetadata {
        self.metadata
    }

    /// The container format of the underlying adapter.
    pub fn format(&self) -> ContainerFormat {
        self.adapter.format()
    }

    /// Index of the frame the next decode will produce.
    pub fn current_index(&self) -> u64 {
        self.current_index
    }

    /// Whether every frame has been decoded.
    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.metadata.total_frames
    }

    /// Reposition so the next decode yields frame `index`.
    ///
    /// # Errors
    ///
    /// - [`FrameGrabError::FrameOutOfRange`] if `index >= total_frames`. The
    ///   cursor is left untouched.
    /// - Any adapter error while repositioning. The cursor then points at
    ///   `index` and the next decode retries the seek.
    pub fn seek_to_index(&mut self, index: u64) -> Result<(), FrameGrabError> {
        let total = self.metadata.total_frames;
        if index >= total {
            return Err(FrameGrabError::FrameOutOfRange { index, total });
        }

        log::debug!("Seeking from frame {} to frame {index}", self.current_index);
        self.current_index = index;
        self.needs_resync = true;
        self.adapter.seek(index)?;
        self.needs_resync = false;
        Ok(())
    }

    /// Reposition to the frame on screen at `seconds` and return its index.
    ///
    /// # Errors
    ///
    /// - [`FrameGrabError::InvalidTimestamp`] if `seconds` is negative, not
    ///   finite, or past the track duration.
    /// - Anything [`seek_to_index`](Self::seek_to_index) returns.
    pub fn seek_to_seconds(&mut self, seconds: f64) -> Result<u64, FrameGrabError> {
        let duration = self.metadata.duration_seconds;
        if !seconds.is_finite() || seconds < 0.0 || seconds > duration {
            return Err(FrameGrabError::InvalidTimestamp { seconds, duration });
        }

        let last = self.metadata.total_frames.saturating_sub(1);
        let index = self.adapter.index_at_seconds(seconds).min(last);
        self.seek_to_index(index)?;
        Ok(index)
    }

    /// Decode the picture at the current index and advance past it.
    ///
    /// Returns the pre-decode index with the picture, or `Ok(None)` at the
    /// end of the stream. On error the index stays where it was.
    pub(crate) fn decode_next(&mut self) -> Result<Option<(u64, NativePicture)>, FrameGrabError> {
        if self.is_exhausted() {
            return Ok(None);
        }

        let index = self.current_index;
        if self.needs_resync {
            self.adapter.seek(index)?;
            self.needs_resync = false;
        }

        match self.adapter.decode_next() {
            Ok(Some(picture)) => {
                log::trace!("Decoded frame {index}");
                self.current_index = index + 1;
                Ok(Some((index, picture)))
            }
            Ok(None) => {
                log::debug!(
                    "Stream ended at frame {index} of {}",
                    self.metadata.total_frames
                );
                Ok(None)
            }
            Err(error) => {
                self.needs_resync = true;
                Err(error)
            }
        }
    }

    /// Move back to `index` after the picture decoded there could not be
    /// used, so the failure is reported at the attempted frame.
    pub(crate) fn restore_failed(&mut self, index: u64) {
        self.current_index = index;
        self.needs_resync = true;
    }
}
