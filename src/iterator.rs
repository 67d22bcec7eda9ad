//! Lazy, pull-based frame iterator.
//!
//! [`FrameIterator`] implements [`Iterator`] and decodes frames on demand.
//! Each call to [`next()`](Iterator::next) decodes exactly one frame, so the
//! frame set is never buffered in memory.
//!
//! Create a `FrameIterator` via [`VideoSession::frames`].
//!
//! # Example
//!
//! ```no_run
//! use framegrab::VideoSession;
//!
//! let mut session = VideoSession::open("input.mp4")?;
//!
//! for result in session.frames().take(10) {
//!     let frame = result?;
//!     frame.save(format!("frame{}.png", frame.index()))?;
//! }
//! # Ok::<(), framegrab::FrameGrabError>(())
//! ```

use crate::{
    adapter::FormatAdapter, conversion::DecodedFrame, error::FrameGrabError,
    session::VideoSession,
};

/// A lazy iterator over the remaining frames of a session.
///
/// The iterator borrows the [`VideoSession`] mutably, so no other access can
/// happen while it is alive. It stops after the end of the stream or after
/// yielding the first error.
pub struct FrameIterator<'a, A> {
    session: &'a mut VideoSession<A>,
    done: bool,
}

impl<'a, A: FormatAdapter> FrameIterator<'a, A> {
    pub(crate) fn new(session: &'a mut VideoSession<A>) -> Self {
        Self {
            session,
            done: false,
        }
    }
}

impl<A: FormatAdapter> Iterator for FrameIterator<'_, A> {
    type Item = Result<DecodedFrame, FrameGrabError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.session.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = self
            .session
            .metadata()
            .total_frames
            .saturating_sub(self.session.current_index());
        (0, usize::try_from(remaining).ok())
    }
}
