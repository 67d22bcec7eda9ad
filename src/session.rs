//! The public frame-retrieval API.
//!
//! A [`VideoSession`] composes a [`StreamCursor`], the adapter it drives and
//! a [`FrameConverter`]. It is the sequential, seekable frame source the
//! extraction driver and the CLI are built on.
//!
//! # Example
//!
//! ```no_run
//! use framegrab::VideoSession;
//!
//! let mut session = VideoSession::open("input.mp4")?;
//! println!("{} frames at {:.2} fps", session.metadata().total_frames, session.frame_rate());
//!
//! let frame = session.frame_at(42)?;
//! frame.save("frame42.png")?;
//!
//! // Sequential access after a random one never seeks again.
//! while let Some(frame) = session.next_frame()? {
//!     println!("frame {} is {}x{}", frame.index(), frame.width(), frame.height());
//! }
//! # Ok::<(), framegrab::FrameGrabError>(())
//! ```

use std::{fmt, path::Path};

use crate::{
    adapter::{DynAdapter, FormatAdapter, open_adapter},
    container::ContainerFormat,
    conversion::{DecodedFrame, FrameConverter},
    cursor::StreamCursor,
    error::FrameGrabError,
    iterator::FrameIterator,
    metadata::VideoStreamMetadata,
};

/// Where a session is in its lifecycle.
///
/// A session is `Opened` from creation and after every successful seek, and
/// `Exhausted` once [`VideoSession::next_frame`] has reported the end of the
/// stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Open and positioned on a frame or at the end.
    Opened,
    /// `next_frame` has returned `Ok(None)`.
    Exhausted,
}

/// A sequential and seekable source of decoded RGB frames.
///
/// Sessions carry mutable cursor state without locking, so calls must come
/// from one thread of control. Independent sessions over different files
/// can run in parallel. The container handle is released when the session
/// is dropped or [`close`](Self::close)d.
pub struct VideoSession<A = DynAdapter> {
    cursor: StreamCursor<A>,
    converter: FrameConverter,
    state: SessionState,
    materialized: Option<Vec<DecodedFrame>>,
}

impl VideoSession {
    /// Open the video at `path` with the adapter for its container format.
    ///
    /// # Errors
    ///
    /// - [`FrameGrabError::NotFound`] if the file is missing or unreadable.
    /// - [`FrameGrabError::UnsupportedFormat`] if the container is not MP4.
    /// - [`FrameGrabError::NoVideoStream`] if the file carries no video.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use framegrab::VideoSession;
    ///
    /// let session = VideoSession::open("input.mp4")?;
    /// assert_eq!(session.current_index(), 0);
    /// # Ok::<(), framegrab::FrameGrabError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameGrabError> {
        Ok(Self::from_adapter(open_adapter(path)?))
    }
}

impl<A: FormatAdapter> VideoSession<A> {
    /// Build a session over an already opened adapter.
    pub fn from_adapter(adapter: A) -> Self {
        Self {
            cursor: StreamCursor::new(adapter),
            converter: FrameConverter::new(),
            state: SessionState::Opened,
            materialized: None,
        }
    }

    /// Track metadata. Constant for the session's lifetime.
    pub fn metadata(&self) -> VideoStreamMetadata {
        self.cursor.metadata()
    }

    /// Frames per second, or `0.0` for a track with no duration.
    pub fn frame_rate(&self) -> f64 {
        self.cursor.metadata().frames_per_second()
    }

    /// The container format being decoded.
    pub fn format(&self) -> ContainerFormat {
        self.cursor.format()
    }

    /// Index of the frame the next [`next_frame`](Self::next_frame) returns.
    pub fn current_index(&self) -> u64 {
        self.cursor.current_index()
    }

    /// The session's lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Position the session so the next frame returned is `index`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameGrabError::FrameOutOfRange`] if `index` is not below
    /// the frame count, without moving the session.
    pub fn seek_to_index(&mut self, index: u64) -> Result<(), FrameGrabError> {
        self.cursor.seek_to_index(index)?;
        self.state = SessionState::Opened;
        Ok(())
    }

    /// Position the session on the frame shown at `seconds` and return its
    /// index.
    ///
    /// # Errors
    ///
    /// Returns [`FrameGrabError::InvalidTimestamp`] if `seconds` is negative
    /// or past the end of the track, without moving the session.
    pub fn seek_to_seconds(&mut self, seconds: f64) -> Result<u64, FrameGrabError> {
        let index = self.cursor.seek_to_seconds(seconds)?;
        self.state = SessionState::Opened;
        Ok(index)
    }

    /// Decode and convert the frame at [`current_index`](Self::current_index).
    ///
    /// The returned frame carries the index it was decoded at. `Ok(None)`
    /// marks the end of the stream and moves the session to
    /// [`SessionState::Exhausted`].
    ///
    /// # Errors
    ///
    /// Returns [`FrameGrabError::DecodeError`] if the frame cannot be decoded
    /// or converted. The session stays at the failed index.
    pub fn next_frame(&mut self) -> Result<Option<DecodedFrame>, FrameGrabError> {
        let Some((index, picture)) = self.cursor.decode_next()? else {
            self.state = SessionState::Exhausted;
            return Ok(None);
        };

        match self.converter.convert(&picture, index) {
            Ok(frame) => Ok(Some(frame)),
            Err(error) => {
                self.cursor.restore_failed(index);
                Err(error)
            }
        }
    }

    /// Return frame `index`, seeking only if it is not the next frame.
    ///
    /// Walking `frame_at(0)`, `frame_at(1)`, ... never seeks.
    ///
    /// # Errors
    ///
    /// - [`FrameGrabError::FrameOutOfRange`] if `index` is not a frame of the
    ///   track.
    /// - [`FrameGrabError::DecodeError`] if the frame cannot be decoded, or
    ///   the stream ends before it.
    pub fn frame_at(&mut self, index: u64) -> Result<DecodedFrame, FrameGrabError> {
        if index != self.current_index() {
            self.seek_to_index(index)?;
        }

        match self.next_frame()? {
            Some(frame) => Ok(frame),
            None if index >= self.metadata().total_frames => Err(FrameGrabError::FrameOutOfRange {
                index,
                total: self.metadata().total_frames,
            }),
            None => Err(FrameGrabError::DecodeError {
                index,
                reason: "stream ended before the frame was reached".to_string(),
            }),
        }
    }

    /// Decode every frame of the track into memory, once.
    ///
    /// The first call rewinds and decodes frames `0..total_frames` in a
    /// single pass; later calls return the same frames without decoding.
    /// This holds the whole video as raw RGB and is only suitable for short
    /// clips. Prefer [`next_frame`](Self::next_frame) or
    /// [`frames`](Self::frames) otherwise.
    ///
    /// # Errors
    ///
    /// Returns the first decode error, or a [`FrameGrabError::DecodeError`]
    /// at the first missing index if the stream ends early. Nothing is
    /// cached in either case.
    pub fn all_frames(&mut self) -> Result<&[DecodedFrame], FrameGrabError> {
        self.materialize()?;
        Ok(self.materialized.as_deref().unwrap_or(&[]))
    }

    /// The materialised frames strictly after the frame shown at `seconds`.
    ///
    /// Decodes the whole track on first use (see
    /// [`all_frames`](Self::all_frames)) and leaves the session positioned
    /// on the located frame.
    ///
    /// # Errors
    ///
    /// - [`FrameGrabError::InvalidTimestamp`] if `seconds` is outside the
    ///   track.
    /// - Any decode error raised while materialising.
    pub fn frames_from(&mut self, seconds: f64) -> Result<&[DecodedFrame], FrameGrabError> {
        self.materialize()?;
        let index = self.seek_to_seconds(seconds)?;

        let frames = self.materialized.as_deref().unwrap_or(&[]);
        let start = usize::try_from(index + 1).map_or(frames.len(), |start| start.min(frames.len()));
        Ok(&frames[start..])
    }

    /// A lazy iterator decoding from the current index to the end.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use framegrab::VideoSession;
    ///
    /// let mut session = VideoSession::open("input.mp4")?;
    /// session.seek_to_seconds(1.5)?;
    /// for frame in session.frames() {
    ///     let frame = frame?;
    ///     frame.save(format!("frame{}.png", frame.index()))?;
    /// }
    /// # Ok::<(), framegrab::FrameGrabError>(())
    /// ```
    pub fn frames(&mut self) -> FrameIterator<'_, A> {
        FrameIterator::new(self)
    }

    /// Release the container handle.
    ///
    /// Dropping the session has the same effect.
    pub fn close(self) {
        log::debug!(
            "Closing {} session at frame {}",
            self.cursor.format(),
            self.cursor.current_index()
        );
    }

    fn materialize(&mut self) -> Result<(), FrameGrabError> {
        if self.materialized.is_some() {
            return Ok(());
        }

        let total = self.metadata().total_frames;
        log::debug!("Materialising all {total} frames");
        let mut frames = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
        if total > 0 && self.current_index() != 0 {
            self.seek_to_index(0)?;
        }
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }

        let decoded = frames.len() as u64;
        if decoded != total {
            return Err(FrameGrabError::DecodeError {
                index: decoded,
                reason: "stream ended before the frame was reached".to_string(),
            });
        }

        self.materialized = Some(frames);
        Ok(())
    }
}

impl<A> fmt::Debug for VideoSession<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoSession")
            .field("state", &self.state)
            .field(
                "materialized",
                &self.materialized.as_ref().map(Vec::len),
            )
            .finish_non_exhaustive()
    }
}
