//! Video stream metadata.
//!
//! [`VideoStreamMetadata`] is read from the track header when a container is
//! opened and never changes afterwards.

use std::time::Duration;

/// Metadata for the single video track of an opened container.
///
/// # Example
///
/// ```no_run
/// use framegrab::VideoSession;
///
/// let session = VideoSession::open("input.mp4")?;
/// let metadata = session.metadata();
/// println!(
///     "{}x{}, {} frames over {:.2}s ({:.2} fps)",
///     metadata.width,
///     metadata.height,
///     metadata.total_frames,
///     metadata.duration_seconds,
///     metadata.frames_per_second(),
/// );
/// # Ok::<(), framegrab::FrameGrabError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct VideoStreamMetadata {
    /// Number of frames in the track. Valid frame indices are
    /// `0..total_frames`.
    pub total_frames: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Track duration in seconds.
    pub duration_seconds: f64,
}

impl VideoStreamMetadata {
    /// Average frame rate, `total_frames / duration_seconds`.
    ///
    /// Returns exactly `0.0` when the duration is zero (or negative), so
    /// callers never divide by zero.
    pub fn frames_per_second(&self) -> f64 {
        if self.duration_seconds <= 0.0 {
            return 0.0;
        }
        self.total_frames as f64 / self.duration_seconds
    }

    /// Track duration as a [`Duration`]. Non-finite or negative durations
    /// map to [`Duration::ZERO`].
    pub fn duration(&self) -> Duration {
        if self.duration_seconds.is_finite() && self.duration_seconds > 0.0 {
            Duration::from_secs_f64(self.duration_seconds)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VideoStreamMetadata;

    #[test]
    fn frame_rate_divides_frames_by_duration() {
        let metadata = VideoStreamMetadata {
            total_frames: 10,
            width: 4,
            height: 4,
            duration_seconds: 2.0,
        };
        assert!((metadata.frames_per_second() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_duration_has_zero_frame_rate() {
        let metadata = VideoStreamMetadata {
            total_frames: 10,
            width: 4,
            height: 4,
            duration_seconds: 0.0,
        };
        assert_eq!(metadata.frames_per_second(), 0.0);
        assert!(metadata.duration().is_zero());
    }
}
