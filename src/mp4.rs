//! MP4 decoder adapter backed by FFmpeg.
//!
//! [`Mp4Adapter`] implements [`FormatAdapter`] for ISO-BMFF files. At open
//! time it scans the video packets once to build a presentation-timestamp
//! table, which gives an exact frame count and keyframe positions without
//! decoding anything. Seeks jump to the keyframe at or before the target and
//! decode forward, so the caller always lands on the exact frame requested.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use ffmpeg_sys_next::AVFrame;

use crate::{
    adapter::FormatAdapter,
    container::ContainerFormat,
    error::FrameGrabError,
    metadata::VideoStreamMetadata,
    picture::{ColorRange, ColorSpace, CropRectangle, NativePicture, Plane},
};

/// How the samples of a natively supported pixel format are laid out.
#[derive(Debug, Clone, Copy)]
struct NativeLayout {
    color_space: ColorSpace,
    bit_depth: u8,
    bytes_per_sample: usize,
}

impl NativeLayout {
    const fn new(color_space: ColorSpace, bit_depth: u8, bytes_per_sample: usize) -> Self {
        Self {
            color_space,
            bit_depth,
            bytes_per_sample,
        }
    }

    /// Layouts the converter handles directly. Everything else goes through
    /// `swscale` first.
    fn for_pixel(pixel: Pixel) -> Option<Self> {
        use ColorRange::{Full, Limited};
        let layout = match pixel {
            Pixel::YUV420P => Self::new(ColorSpace::Yuv420(Limited), 8, 1),
            Pixel::YUVJ420P => Self::new(ColorSpace::Yuv420(Full), 8, 1),
            Pixel::YUV422P => Self::new(ColorSpace::Yuv422(Limited), 8, 1),
            Pixel::YUVJ422P => Self::new(ColorSpace::Yuv422(Full), 8, 1),
            Pixel::YUV444P => Self::new(ColorSpace::Yuv444(Limited), 8, 1),
            Pixel::YUVJ444P => Self::new(ColorSpace::Yuv444(Full), 8, 1),
            Pixel::YUV420P10LE => Self::new(ColorSpace::Yuv420(Limited), 10, 2),
            Pixel::YUV422P10LE => Self::new(ColorSpace::Yuv422(Limited), 10, 2),
            Pixel::YUV444P10LE => Self::new(ColorSpace::Yuv444(Limited), 10, 2),
            Pixel::GRAY8 => Self::new(ColorSpace::Gray, 8, 1),
            Pixel::RGB24 => Self::new(ColorSpace::Rgb, 8, 1),
            Pixel::BGR24 => Self::new(ColorSpace::Bgr, 8, 1),
            _ => return None,
        };
        Some(layout)
    }
}

/// FFmpeg-backed adapter for the single video track of an MP4 file.
pub struct Mp4Adapter {
    input_context: Input,
    decoder: VideoDecoder,
    /// Lazily built converter for pixel formats outside [`NativeLayout`].
    scaler: Option<(Pixel, u32, u32, ScalingContext)>,
    video_stream_index: usize,
    time_base: Rational,
    /// Presentation timestamp of every frame, in display order.
    timestamps: Vec<i64>,
    /// Display indices of keyframes, ascending.
    keyframes: Vec<u64>,
    metadata: VideoStreamMetadata,
    /// Index the next `decode_next` call yields.
    next_index: u64,
    /// Picture already decoded by a seek, returned by the next decode.
    pending: Option<NativePicture>,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    eof_sent: bool,
    path: PathBuf,
}

impl Debug for Mp4Adapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Mp4Adapter")
            .field("path", &self.path)
            .field("video_stream_index", &self.video_stream_index)
            .field("metadata", &self.metadata)
            .field("keyframes", &self.keyframes.len())
            .field("next_index", &self.next_index)
            .finish_non_exhaustive()
    }
}

impl Mp4Adapter {
    /// Open the MP4 file at `path` and index its video track.
    ///
    /// The container format is not re-checked here; use
    /// [`open_adapter`](crate::open_adapter) to get format detection.
    ///
    /// # Errors
    ///
    /// - [`FrameGrabError::NotFound`] if FFmpeg cannot open the file.
    /// - [`FrameGrabError::NoVideoStream`] if there is no video track.
    /// - [`FrameGrabError::FfmpegError`] if the decoder cannot be created
    ///   or the demuxer cannot rewind after indexing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameGrabError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening MP4 container: {}", path.display());

        ffmpeg_next::init().map_err(|error| {
            FrameGrabError::FfmpegError(format!("FFmpeg initialisation failed: {error}"))
        })?;

        let mut input_context = ffmpeg_next::format::input(&path).map_err(|error| {
            if path.exists() {
                FrameGrabError::FfmpegError(format!(
                    "cannot open {} as MP4: {error}",
                    path.display()
                ))
            } else {
                FrameGrabError::NotFound {
                    path: path.clone(),
                    reason: error.to_string(),
                }
            }
        })?;

        let video_track_count = input_context
            .streams()
            .filter(|stream| stream.parameters().medium() == Type::Video)
            .count();
        if video_track_count > 1 {
            log::warn!(
                "{} holds {video_track_count} video tracks; using the default one",
                path.display()
            );
        }

        let (video_stream_index, time_base, stream_duration, stream_frames, decoder) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(FrameGrabError::NoVideoStream)?;
            let decoder_context = CodecContext::from_parameters(stream.parameters())?;
            let decoder = decoder_context.decoder().video()?;
            (
                stream.index(),
                stream.time_base(),
                stream.duration(),
                stream.frames(),
                decoder,
            )
        };

        let (timestamps, keyframes) = index_video_packets(&mut input_context, video_stream_index);

        let total_frames = if timestamps.is_empty() {
            stream_frames.max(0) as u64
        } else {
            timestamps.len() as u64
        };

        let duration_seconds = if stream_duration > 0 {
            crate::utilities::pts_to_seconds(stream_duration, time_base)
        } else if input_context.duration() > 0 {
            input_context.duration() as f64 / 1_000_000.0
        } else {
            0.0
        };

        let metadata = VideoStreamMetadata {
            total_frames,
            width: decoder.width(),
            height: decoder.height(),
            duration_seconds,
        };
        log::debug!(
            "Indexed video stream {video_stream_index}: {} frames, {} keyframes, {:.3}s",
            metadata.total_frames,
            keyframes.len(),
            metadata.duration_seconds,
        );

        let mut adapter = Self {
            input_context,
            decoder,
            scaler: None,
            video_stream_index,
            time_base,
            timestamps,
            keyframes,
            metadata,
            next_index: 0,
            pending: None,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            eof_sent: false,
            path,
        };
        adapter.rewind()?;
        Ok(adapter)
    }

    /// Path of the opened file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seek the demuxer back to the first packet and reset the decoder.
    fn rewind(&mut self) -> Result<(), FrameGrabError> {
        self.input_context.seek(i64::MIN, ..)?;
        self.reset_decoder();
        self.next_index = 0;
        Ok(())
    }

    fn reset_decoder(&mut self) {
        self.decoder.flush();
        self.eof_sent = false;
        self.pending = None;
    }

    fn decode_error(&self, index: u64, reason: impl ToString) -> FrameGrabError {
        FrameGrabError::DecodeError {
            index,
            reason: reason.to_string(),
        }
    }

    /// Pull the next decoded frame into `decoded_frame`, feeding packets as
    /// needed. Returns the frame's timestamp, or `None` once drained.
    fn receive_next_frame(&mut self, index: u64) -> Result<Option<i64>, FrameGrabError> {
        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let timestamp = self
                    .decoded_frame
                    .timestamp()
                    .or_else(|| self.decoded_frame.pts())
                    .or_else(|| self.timestamps.get(index as usize).copied())
                    .unwrap_or(0);
                log::trace!("Decoded frame with timestamp {timestamp}");
                return Ok(Some(timestamp));
            }

            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder
                            .send_packet(&packet)
                            .map_err(|error| self.decode_error(index, error))?;
                    }
                }
                Err(ffmpeg_next::Error::Eof) => {
                    self.decoder
                        .send_eof()
                        .map_err(|error| self.decode_error(index, error))?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    log::debug!("Skipping unreadable packet: {error}");
                }
            }
        }
    }

    /// Decode forward, discarding frames shown before `target_timestamp`.
    /// Returns the timestamp of the first frame at or after the target.
    fn discard_until(
        &mut self,
        index: u64,
        target_timestamp: i64,
    ) -> Result<Option<i64>, FrameGrabError> {
        while let Some(timestamp) = self.receive_next_frame(index)? {
            if timestamp >= target_timestamp {
                return Ok(Some(timestamp));
            }
        }
        Ok(None)
    }

    /// Copy the current decoded frame into a [`NativePicture`].
    fn native_picture(&mut self, index: u64) -> Result<NativePicture, FrameGrabError> {
        let width = self.decoded_frame.width();
        let height = self.decoded_frame.height();
        let pixel = self.decoded_frame.format();

        let picture = match NativeLayout::for_pixel(pixel) {
            Some(layout) => {
                let planes = (0..layout.color_space.plane_count())
                    .map(|plane| copy_plane(&self.decoded_frame, plane, layout.bytes_per_sample))
                    .collect();
                NativePicture::new(layout.color_space, width, height, planes)
                    .with_bit_depth(layout.bit_depth)
            }
            None => {
                let rebuild = !matches!(
                    &self.scaler,
                    Some((format, w, h, _)) if *format == pixel && *w == width && *h == height
                );
                if rebuild {
                    log::debug!("Normalising {pixel:?} frames to RGB24 with swscale");
                    let context = ScalingContext::get(
                        pixel,
                        width,
                        height,
                        Pixel::RGB24,
                        width,
                        height,
                        ScalingFlags::BILINEAR,
                    )
                    .map_err(|error| self.decode_error(index, error))?;
                    self.scaler = Some((pixel, width, height, context));
                }
                if let Some((_, _, _, context)) = self.scaler.as_mut() {
                    context
                        .run(&self.decoded_frame, &mut self.scaled_frame)
                        .map_err(|error| FrameGrabError::DecodeError {
                            index,
                            reason: error.to_string(),
                        })?;
                }
                let plane = copy_plane(&self.scaled_frame, 0, 1);
                NativePicture::new(ColorSpace::Rgb, width, height, vec![plane])
            }
        };

        Ok(match frame_crop(&self.decoded_frame) {
            Some(crop) => picture.with_crop(crop),
            None => picture,
        })
    }
}

impl FormatAdapter for Mp4Adapter {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Mp4
    }

    fn metadata(&self) -> VideoStreamMetadata {
        self.metadata
    }

    fn seek(&mut self, index: u64) -> Result<(), FrameGrabError> {
        let target_timestamp = *self.timestamps.get(index as usize).ok_or(
            FrameGrabError::FrameOutOfRange {
                index,
                total: self.metadata.total_frames,
            },
        )?;

        let keyframe_position = self.keyframes.partition_point(|&key| key <= index);
        let keyframe_index = keyframe_position
            .checked_sub(1)
            .and_then(|position| self.keyframes.get(position))
            .copied()
            .unwrap_or(0);
        let keyframe_timestamp = self
            .timestamps
            .get(keyframe_index as usize)
            .copied()
            .unwrap_or(target_timestamp);

        log::debug!("Seeking to frame {index} via keyframe {keyframe_index}");

        let seek_timestamp =
            crate::utilities::pts_to_seek_timestamp(keyframe_timestamp, self.time_base);
        if let Err(error) = self.input_context.seek(seek_timestamp, ..seek_timestamp) {
            log::debug!("Keyframe seek failed ({error}); rewinding instead");
            self.input_context.seek(i64::MIN, ..)?;
        }
        self.reset_decoder();

        let mut landed = self.discard_until(index, target_timestamp)?;
        if landed.is_some_and(|timestamp| timestamp > target_timestamp) {
            // The demuxer landed past the target; decode from the start.
            log::debug!("Seek overshot frame {index}; decoding from the first frame");
            self.input_context.seek(i64::MIN, ..)?;
            self.reset_decoder();
            landed = self.discard_until(index, target_timestamp)?;
        }

        match landed {
            None => {
                return Err(self.decode_error(index, "stream ended before the requested frame"));
            }
            Some(timestamp) if timestamp != target_timestamp => {
                return Err(self.decode_error(
                    index,
                    format!("frame not produced by the decoder (expected pts {target_timestamp}, got {timestamp})"),
                ));
            }
            Some(_) => {}
        }

        let picture = self.native_picture(index)?;
        self.pending = Some(picture);
        self.next_index = index;
        Ok(())
    }

    fn index_at_seconds(&self, seconds: f64) -> u64 {
        let Some(&first) = self.timestamps.first() else {
            return 0;
        };
        let shown = self.timestamps.partition_point(|&timestamp| {
            crate::utilities::pts_to_seconds(timestamp - first, self.time_base) <= seconds
        });
        (shown.saturating_sub(1) as u64).min(self.metadata.total_frames.saturating_sub(1))
    }

    fn decode_next(&mut self) -> Result<Option<NativePicture>, FrameGrabError> {
        let index = self.next_index;
        if let Some(picture) = self.pending.take() {
            self.next_index += 1;
            return Ok(Some(picture));
        }

        let Some(timestamp) = self.receive_next_frame(index)? else {
            log::debug!("End of video stream after {index} frames");
            return Ok(None);
        };
        if !is_expected_timestamp(&self.timestamps, index, timestamp) {
            // The decoder dropped or reordered a frame; the next one is not `index`.
            self.next_index += 1;
            return Err(self.decode_error(
                index,
                format!("decoder produced pts {timestamp} where frame {index} was expected"),
            ));
        }

        let picture = self.native_picture(index)?;
        self.next_index += 1;
        Ok(Some(picture))
    }
}

/// Scan every packet once, collecting video presentation timestamps in
/// display order and the display indices of keyframes.
fn index_video_packets(input_context: &mut Input, video_stream_index: usize) -> (Vec<i64>, Vec<u64>) {
    let mut timestamps = Vec::new();
    let mut keyframe_timestamps = Vec::new();

    for (stream, packet) in input_context.packets() {
        if stream.index() != video_stream_index {
            continue;
        }
        let Some(timestamp) = packet.pts().or_else(|| packet.dts()) else {
            continue;
        };
        timestamps.push(timestamp);
        if packet.is_key() {
            keyframe_timestamps.push(timestamp);
        }
    }

    timestamps.sort_unstable();
    timestamps.dedup();

    let mut keyframes: Vec<u64> = keyframe_timestamps
        .iter()
        .filter_map(|timestamp| timestamps.binary_search(timestamp).ok())
        .map(|position| position as u64)
        .collect();
    keyframes.sort_unstable();
    keyframes.dedup();

    (timestamps, keyframes)
}

/// Whether a decoded frame stamped `timestamp` is frame `index`. Tracks
/// without an index table accept any timestamp.
fn is_expected_timestamp(timestamps: &[i64], index: u64, timestamp: i64) -> bool {
    usize::try_from(index)
        .ok()
        .and_then(|position| timestamps.get(position))
        .is_none_or(|&expected| expected == timestamp)
}

/// Copy plane `plane` of `frame` into owned samples.
fn copy_plane(frame: &VideoFrame, plane: usize, bytes_per_sample: usize) -> Plane {
    let stride_bytes = frame.stride(plane);
    let rows = frame.plane_height(plane) as usize;
    let data = frame.data(plane);
    let used = data.get(..stride_bytes * rows).unwrap_or(data);

    let samples: Vec<u16> = if bytes_per_sample == 2 {
        used.chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    } else {
        used.iter().map(|&byte| u16::from(byte)).collect()
    };

    Plane::new(samples, stride_bytes / bytes_per_sample)
}

/// Read the decoder's crop fields. FFmpeg applies cropping by default, so
/// this is usually `None`.
fn frame_crop(frame: &VideoFrame) -> Option<CropRectangle> {
    let raw: *const AVFrame = unsafe { frame.as_ptr() };
    let (top, bottom, left, right) =
        unsafe { ((*raw).crop_top, (*raw).crop_bottom, (*raw).crop_left, (*raw).crop_right) };

    if top == 0 && bottom == 0 && left == 0 && right == 0 {
        return None;
    }

    let width = frame.width();
    let height = frame.height();
    Some(CropRectangle::new(
        left as u32,
        top as u32,
        width.saturating_sub((left + right) as u32),
        height.saturating_sub((top + bottom) as u32),
    ))
}

#[cfg(test)]
mod tests {
    use super::is_expected_timestamp;

    #[test]
    fn decoded_timestamp_must_match_the_index_table() {
        let timestamps = [0, 512, 1024, 1536];
        assert!(is_expected_timestamp(&timestamps, 2, 1024));
        assert!(!is_expected_timestamp(&timestamps, 2, 1536));
        assert!(!is_expected_timestamp(&timestamps, 0, 512));
    }

    #[test]
    fn missing_index_entries_accept_any_timestamp() {
        assert!(is_expected_timestamp(&[], 0, 4096));
        assert!(is_expected_timestamp(&[0, 512], 5, 4096));
    }
}
