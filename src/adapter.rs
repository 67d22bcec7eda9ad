//! The decoder adapter seam.
//!
//! A [`FormatAdapter`] wraps one container/codec combination behind the
//! capability set the rest of the crate needs: report the detected format,
//! expose track metadata, reposition to a frame, and decode the next native
//! picture. The [`StreamCursor`](crate::StreamCursor) and
//! [`FrameConverter`](crate::FrameConverter) only talk to this trait, so new
//! container kinds are added as new implementations and a new arm in
//! [`open_adapter`].

use std::path::Path;

use crate::{
    container::ContainerFormat, error::FrameGrabError, metadata::VideoStreamMetadata,
    mp4::Mp4Adapter, picture::NativePicture,
};

/// A boxed adapter chosen at runtime by [`open_adapter`].
pub type DynAdapter = Box<dyn FormatAdapter>;

/// Demux + decode capability for a single-video-track container.
///
/// Implementations keep their own read position. After
/// [`seek(i)`](FormatAdapter::seek) succeeds, the next
/// [`decode_next`](FormatAdapter::decode_next) must yield frame `i`;
/// every successful `decode_next` advances the position by one frame.
/// Range validation is the caller's job.
pub trait FormatAdapter {
    /// The container format this adapter demuxes.
    fn format(&self) -> ContainerFormat;

    /// Track metadata. Must be constant for the adapter's lifetime.
    fn metadata(&self) -> VideoStreamMetadata;

    /// Reposition so the next decode yields frame `index`.
    ///
    /// Callers guarantee `index < metadata().total_frames`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying demuxer cannot seek or if the
    /// frames between the preceding keyframe and `index` fail to decode.
    fn seek(&mut self, index: u64) -> Result<(), FrameGrabError>;

    /// The index of the frame on screen at `seconds`.
    ///
    /// The default derives it from the average frame rate. Adapters with
    /// per-frame timestamps should override it.
    fn index_at_seconds(&self, seconds: f64) -> u64 {
        let metadata = self.metadata();
        let last = metadata.total_frames.saturating_sub(1);
        let index = (seconds * metadata.frames_per_second()).floor();
        if index.is_finite() && index > 0.0 {
            (index as u64).min(last)
        } else {
            0
        }
    }

    /// Decode the picture at the current position and advance by one.
    ///
    /// Returns `Ok(None)` once no coded frames remain.
    ///
    /// # Errors
    ///
    /// Returns [`FrameGrabError::DecodeError`] if the bitstream for the
    /// frame cannot be decoded.
    fn decode_next(&mut self) -> Result<Option<NativePicture>, FrameGrabError>;
}

impl<A: FormatAdapter + ?Sized> FormatAdapter for Box<A> {
    fn format(&self) -> ContainerFormat {
        (**self).format()
    }

    fn metadata(&self) -> VideoStreamMetadata {
        (**self).metadata()
    }

    fn seek(&mut self, index: u64) -> Result<(), FrameGrabError> {
        (**self).seek(index)
    }

    fn index_at_seconds(&self, seconds: f64) -> u64 {
        (**self).index_at_seconds(seconds)
    }

    fn decode_next(&mut self) -> Result<Option<NativePicture>, FrameGrabError> {
        (**self).decode_next()
    }
}

/// Detect the container at `path` and open the matching adapter.
///
/// # Errors
///
/// - [`FrameGrabError::NotFound`] if the file is missing or unreadable.
/// - [`FrameGrabError::UnsupportedFormat`] if the container is not MP4.
/// - Any error the adapter raises while opening the track.
pub fn open_adapter<P: AsRef<Path>>(path: P) -> Result<DynAdapter, FrameGrabError> {
    let path = path.as_ref();
    match ContainerFormat::detect(path)? {
        ContainerFormat::Mp4 => Ok(Box::new(Mp4Adapter::open(path)?)),
        format => Err(FrameGrabError::UnsupportedFormat {
            path: path.to_path_buf(),
            format,
        }),
    }
}
