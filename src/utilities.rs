//! Internal utility functions.
//!
//! Timestamp conversions shared by the MP4 adapter.

use ffmpeg_next::Rational;

/// Rescale a PTS value from stream time base to seconds.
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert a PTS value to a seek timestamp in `AV_TIME_BASE` (microseconds).
///
/// `input_context.seek()` seeks with `stream_index = -1`, which takes
/// `AV_TIME_BASE` units. The result is rounded up so that the frame at `pts`
/// is never after the seek point.
pub fn pts_to_seek_timestamp(pts: i64, time_base: Rational) -> i64 {
    (pts_to_seconds(pts, time_base) * 1_000_000.0).ceil() as i64
}

#[cfg(test)]
mod tests {
    use ffmpeg_next::Rational;

    use super::{pts_to_seconds, pts_to_seek_timestamp};

    #[test]
    fn pts_in_ninety_khz_time_base() {
        let time_base = Rational::new(1, 90_000);
        assert!((pts_to_seconds(180_000, time_base) - 2.0).abs() < 1e-9);
        assert_eq!(pts_to_seek_timestamp(180_000, time_base), 2_000_000);
    }

    #[test]
    fn seek_timestamp_rounds_up() {
        // 1/3 s = 333_333.33 µs
        let time_base = Rational::new(1, 3);
        assert_eq!(pts_to_seek_timestamp(1, time_base), 333_334);
    }
}
