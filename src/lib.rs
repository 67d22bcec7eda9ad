//! # framegrab
//!
//! Frame-precise extraction of decoded RGB frames and track metadata from
//! MP4 video files.
//!
//! `framegrab` demuxes and decodes video with FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate, converts each
//! decoder picture into a cropped, tightly packed RGB buffer, and writes
//! frames as still images with the [`image`] crate.
//!
//! ## Quick Start
//!
//! ### Read One Frame
//!
//! ```no_run
//! use framegrab::VideoSession;
//!
//! let mut session = VideoSession::open("input.mp4")?;
//! let frame = session.frame_at(0)?;
//! frame.save("first_frame.png")?;
//! # Ok::<(), framegrab::FrameGrabError>(())
//! ```
//!
//! ### Walk Every Frame
//!
//! ```no_run
//! use framegrab::VideoSession;
//!
//! let mut session = VideoSession::open("input.mp4")?;
//! while let Some(frame) = session.next_frame()? {
//!     println!("frame {}: {} bytes", frame.index(), frame.pixel_data().len());
//! }
//! # Ok::<(), framegrab::FrameGrabError>(())
//! ```
//!
//! ### Extract a Whole Video to Disk
//!
//! ```no_run
//! use framegrab::{ExtractOptions, extract_all};
//!
//! let report = extract_all("input.mp4", &ExtractOptions::new())?;
//! println!("wrote {} frames to {}", report.frames_written, report.run_directory.display());
//! # Ok::<(), framegrab::FrameGrabError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`FormatAdapter`] wraps one container kind behind demux, seek and
//!   decode capabilities. [`open_adapter`] picks the implementation from the
//!   sniffed [`ContainerFormat`]; only [`Mp4Adapter`] exists today.
//! - [`StreamCursor`] owns the adapter and the current frame index, and
//!   validates every seek.
//! - [`FrameConverter`] turns a [`NativePicture`] into a [`DecodedFrame`].
//! - [`VideoSession`] composes the three into the public API.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `FrameStream` decodes on a Tokio blocking thread |
//! | `rayon` | `extract_many()` extracts several videos across rayon threads |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod adapter;
mod colorspace;
pub mod configuration;
pub mod container;
pub mod conversion;
pub mod cursor;
pub mod error;
pub mod extract;
pub mod ffmpeg;
pub mod iterator;
pub mod metadata;
pub mod mp4;
#[cfg(feature = "rayon")]
pub mod parallel;
pub mod picture;
pub mod probe;
pub mod progress;
pub mod session;
#[cfg(feature = "async")]
pub mod stream;
mod utilities;

pub use adapter::{DynAdapter, FormatAdapter, open_adapter};
pub use configuration::{ExtractOptions, ImageFormat};
pub use container::ContainerFormat;
pub use conversion::{DecodedFrame, FrameConverter};
pub use cursor::StreamCursor;
pub use error::FrameGrabError;
pub use extract::{
    ExtractionReport, SIDECAR_FILE_NAME, create_run_directory, extract_all, extract_session,
    frame_file_name, generate_run_id, sidecar_contents, write_sidecar,
};
pub use ffmpeg::{FfmpegLogLevel, ffmpeg_log_level, set_ffmpeg_log_level};
pub use iterator::FrameIterator;
pub use metadata::VideoStreamMetadata;
pub use mp4::Mp4Adapter;
#[cfg(feature = "rayon")]
pub use parallel::extract_many;
pub use picture::{ColorRange, ColorSpace, CropRectangle, NativePicture, Plane};
pub use probe::{ProbeReport, VideoProbe};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use session::{SessionState, VideoSession};
#[cfg(feature = "async")]
pub use stream::FrameStream;
