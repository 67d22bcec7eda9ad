//! Error types for the `framegrab` crate.
//!
//! This module defines [`FrameGrabError`], the unified error type returned by
//! every fallible operation in the crate. Variants carry the context needed to
//! diagnose a failure without extra logging at the call site: file paths,
//! frame indices, and upstream error messages.
//!
//! Reaching the end of a stream is **not** an error. Sequential decoding
//! signals exhaustion with `Ok(None)`.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

use crate::container::ContainerFormat;

/// The unified error type for all `framegrab` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameGrabError {
    /// The input source is missing or cannot be read.
    #[error("Media file not found at {path}: {reason}")]
    NotFound {
        /// Path that was passed to the open call.
        path: PathBuf,
        /// Underlying reason the file could not be read.
        reason: String,
    },

    /// The container is not the supported MP4 family.
    #[error("Unsupported container format {format} at {path}: only MP4 is supported")]
    UnsupportedFormat {
        /// Path of the rejected file.
        path: PathBuf,
        /// The format detected from the file header.
        format: ContainerFormat,
    },

    /// A caller-supplied argument is outside its valid domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A seek index is not in `[0, total_frames)`.
    #[error("Frame {index} is out of range (video has {total} frames)")]
    FrameOutOfRange {
        /// The index that was requested.
        index: u64,
        /// The total number of frames in the video.
        total: u64,
    },

    /// A seek time is negative, not finite, or beyond the video duration.
    #[error("Invalid timestamp {seconds}s (video lasts {duration}s)")]
    InvalidTimestamp {
        /// The requested time in seconds.
        seconds: f64,
        /// The duration of the video in seconds.
        duration: f64,
    },

    /// The container holds no decodable video track.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The frame at `index` could not be decoded or converted.
    #[error("Failed to decode frame {index}: {reason}")]
    DecodeError {
        /// Index of the frame whose decode failed.
        index: u64,
        /// Upstream error message.
        reason: String,
    },

    /// An error originating from the FFmpeg libraries outside of decoding.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// The `image` crate failed to encode or build a still image.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// An extraction run was cancelled via a
    /// [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl FrameGrabError {
    /// Returns `true` for every flavour of caller error: a generic invalid
    /// argument, an out-of-range index, or an invalid timestamp.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            FrameGrabError::InvalidArgument(_)
                | FrameGrabError::FrameOutOfRange { .. }
                | FrameGrabError::InvalidTimestamp { .. }
        )
    }
}

impl From<FfmpegError> for FrameGrabError {
    fn from(error: FfmpegError) -> Self {
        FrameGrabError::FfmpegError(error.to_string())
    }
}
