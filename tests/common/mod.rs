//! In-memory video source shared by the integration tests.
//!
//! [`SyntheticAdapter`] implements `FormatAdapter` without touching FFmpeg.
//! Frame `i` is a packed RGB picture whose samples are derived from `i`, so
//! tests can tell frames apart by content. Shared counters record how often
//! the session decoded and sought.

#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use framegrab::{
    ContainerFormat, FormatAdapter, FrameGrabError, NativePicture, VideoSession,
    VideoStreamMetadata,
};

pub fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

/// Decode, seek and release counts, readable after the adapter moved into
/// a session.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    decodes: Arc<AtomicU64>,
    seeks: Arc<AtomicU64>,
    releases: Arc<AtomicU64>,
}

impl Counters {
    pub fn decodes(&self) -> u64 {
        self.decodes.load(Ordering::SeqCst)
    }

    pub fn seeks(&self) -> u64 {
        self.seeks.load(Ordering::SeqCst)
    }

    /// How many times the adapter was dropped.
    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct SyntheticAdapter {
    metadata: VideoStreamMetadata,
    position: u64,
    failing_frame: Option<u64>,
    end_of_stream: Option<u64>,
    counters: Counters,
}

impl SyntheticAdapter {
    pub fn new(total_frames: u64, width: u32, height: u32, duration_seconds: f64) -> Self {
        Self {
            metadata: VideoStreamMetadata {
                total_frames,
                width,
                height,
                duration_seconds,
            },
            position: 0,
            failing_frame: None,
            end_of_stream: None,
            counters: Counters::default(),
        }
    }

    /// Make every decode of frame `index` fail.
    pub fn failing_at(mut self, index: u64) -> Self {
        self.failing_frame = Some(index);
        self
    }

    /// Report end of stream at frame `index`, short of the advertised count.
    pub fn ending_at(mut self, index: u64) -> Self {
        self.end_of_stream = Some(index);
        self
    }

    pub fn counters(&self) -> Counters {
        self.counters.clone()
    }
}

impl Drop for SyntheticAdapter {
    fn drop(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// The sample value frame `index` carries at byte offset `offset`.
pub fn sample_value(index: u64, offset: usize) -> u8 {
    ((index as usize * 31 + offset) % 256) as u8
}

impl FormatAdapter for SyntheticAdapter {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Mp4
    }

    fn metadata(&self) -> VideoStreamMetadata {
        self.metadata
    }

    fn seek(&mut self, index: u64) -> Result<(), FrameGrabError> {
        self.counters.seeks.fetch_add(1, Ordering::SeqCst);
        self.position = index;
        Ok(())
    }

    fn decode_next(&mut self) -> Result<Option<NativePicture>, FrameGrabError> {
        self.counters.decodes.fetch_add(1, Ordering::SeqCst);
        let index = self.position;
        if index >= self.metadata.total_frames || self.end_of_stream.is_some_and(|end| index >= end) {
            return Ok(None);
        }
        if self.failing_frame == Some(index) {
            self.position += 1;
            return Err(FrameGrabError::DecodeError {
                index,
                reason: "corrupt slice".to_string(),
            });
        }

        let length = (self.metadata.width * self.metadata.height * 3) as usize;
        let samples = (0..length).map(|offset| u16::from(sample_value(index, offset))).collect();
        self.position += 1;
        Ok(Some(NativePicture::rgb(
            self.metadata.width,
            self.metadata.height,
            samples,
        )))
    }
}

/// The 10-frame, 4x4, 2-second clip used across the tests.
pub fn ten_frame_session() -> (VideoSession<SyntheticAdapter>, Counters) {
    let adapter = SyntheticAdapter::new(10, 4, 4, 2.0);
    let counters = adapter.counters();
    (VideoSession::from_adapter(adapter), counters)
}
