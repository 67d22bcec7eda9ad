//! Async frame streaming.
//!
//! [`FrameStream`] decodes a video on a `tokio::task::spawn_blocking`
//! thread and hands frames back through a bounded channel, so CPU-heavy
//! FFmpeg work never runs on the async executor. The blocking thread opens
//! its own [`VideoSession`]; nothing is shared with the caller.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use framegrab::{FrameGrabError, FrameStream};
//!
//! # async fn example() -> Result<(), FrameGrabError> {
//! let mut stream = FrameStream::open("input.mp4");
//!
//! while let Some(result) = stream.next().await {
//!     let frame = result?;
//!     frame.save(format!("frame{}.png", frame.index()))?;
//! }
//! # Ok(())
//! # }
//! ```

use std::{
    path::PathBuf,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::{
    sync::mpsc::{Receiver, Sender},
    task::JoinHandle,
};
use tokio_stream::Stream;

use crate::{conversion::DecodedFrame, error::FrameGrabError, session::VideoSession};

/// Default bounded-channel capacity.
///
/// Kept small: every queued item is a full raw RGB frame.
const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type FrameResult = Result<DecodedFrame, FrameGrabError>;

/// A stream of decoded frames produced by a background decode thread.
///
/// Implements [`tokio_stream::Stream`], so it works with
/// [`StreamExt`](tokio_stream::StreamExt) combinators. The stream ends after
/// the last frame or after yielding the first error. Dropping it closes the
/// channel, which stops the decode thread at the next frame boundary.
///
/// Must be created from within a Tokio runtime.
pub struct FrameStream {
    receiver: Receiver<FrameResult>,
    handle: JoinHandle<()>,
}

impl FrameStream {
    /// Stream every frame of the video at `path`.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self::starting_at(path, 0, None)
    }

    /// Stream frames from `start_index` to the end.
    ///
    /// `capacity` bounds how many decoded frames may wait in the channel.
    /// `None` uses a default of 8.
    pub fn starting_at<P: Into<PathBuf>>(
        path: P,
        start_index: u64,
        capacity: Option<usize>,
    ) -> Self {
        let path = path.into();
        let capacity = capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY).max(1);
        let (sender, receiver) = tokio::sync::mpsc::channel(capacity);

        let handle = tokio::task::spawn_blocking(move || {
            if let Err(error) = decode_blocking(path, start_index, &sender) {
                // The receiver may already be gone.
                let _ = sender.blocking_send(Err(error));
            }
        });

        Self { receiver, handle }
    }

    /// Whether the decode thread has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Stream for FrameStream {
    type Item = FrameResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Decode loop run on the blocking thread.
fn decode_blocking(
    path: PathBuf,
    start_index: u64,
    sender: &Sender<FrameResult>,
) -> Result<(), FrameGrabError> {
    let mut session = VideoSession::open(&path)?;
    if start_index != 0 {
        session.seek_to_index(start_index)?;
    }

    while let Some(frame) = session.next_frame()? {
        if sender.blocking_send(Ok(frame)).is_err() {
            log::debug!(
                "Frame stream for {} dropped at frame {}",
                path.display(),
                session.current_index()
            );
            break;
        }
    }
    Ok(())
}
