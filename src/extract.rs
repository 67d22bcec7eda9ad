//! Whole-video extraction to disk.
//!
//! [`extract_all`] opens a video, creates a fresh run directory, writes a
//! `meta.txt` sidecar and then one still image per frame, named
//! `frame{index}.{ext}`. The sidecar holds one value per line: total frame
//! count, width, height, frames per second, duration in seconds.
//!
//! A run aborts on the first error. A skipped frame would break the
//! contiguous frame numbering the sidecar promises.
//!
//! # Example
//!
//! ```no_run
//! use framegrab::{ExtractOptions, ImageFormat, extract_all};
//!
//! let options = ExtractOptions::new()
//!     .with_output_root("frames")
//!     .with_image_format(ImageFormat::Png);
//! let report = extract_all("input.mp4", &options)?;
//! println!("{} frames in {}", report.frames_written, report.run_directory.display());
//! # Ok::<(), framegrab::FrameGrabError>(())
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use chrono::Utc;

use crate::{
    adapter::FormatAdapter,
    configuration::{ExtractOptions, ImageFormat},
    error::FrameGrabError,
    metadata::VideoStreamMetadata,
    progress::ProgressTracker,
    session::VideoSession,
};

/// Name of the metadata sidecar inside a run directory.
pub const SIDECAR_FILE_NAME: &str = "meta.txt";

static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// What an extraction run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    /// The freshly created directory holding the run's files.
    pub run_directory: PathBuf,
    /// Path of the `meta.txt` sidecar.
    pub sidecar: PathBuf,
    /// Number of frame images written.
    pub frames_written: u64,
    /// Format of the frame images.
    pub image_format: ImageFormat,
    /// Metadata of the extracted track.
    pub metadata: VideoStreamMetadata,
}

/// Extract every frame of the video at `input`.
///
/// The video is opened before anything is written, so a missing or
/// unsupported input leaves no directory behind.
///
/// # Errors
///
/// - [`FrameGrabError::NotFound`] / [`FrameGrabError::UnsupportedFormat`]
///   if the input cannot be opened.
/// - [`FrameGrabError::IoError`] if the run directory or sidecar cannot be
///   created.
/// - [`FrameGrabError::DecodeError`] or [`FrameGrabError::ImageError`] for
///   the first frame that fails.
/// - [`FrameGrabError::Cancelled`] if the options' token is cancelled.
pub fn extract_all<P: AsRef<Path>>(
    input: P,
    options: &ExtractOptions,
) -> Result<ExtractionReport, FrameGrabError> {
    let input = input.as_ref();
    log::debug!("Extracting all frames of {}", input.display());
    let mut session = VideoSession::open(input)?;
    let report = extract_session(&mut session, options)?;
    session.close();
    Ok(report)
}

/// Extract every frame of an already opened session.
///
/// Frames are fetched with [`VideoSession::frame_at`] in index order, so a
/// session positioned at frame 0 is never sought.
///
/// # Errors
///
/// As [`extract_all`], minus the open errors.
pub fn extract_session<A: FormatAdapter>(
    session: &mut VideoSession<A>,
    options: &ExtractOptions,
) -> Result<ExtractionReport, FrameGrabError> {
    let metadata = session.metadata();
    let run_directory = create_run_directory(&options.output_root)?;
    let sidecar = write_sidecar(&run_directory, &metadata)?;

    let format = options.image_format;
    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        Some(metadata.total_frames),
        options.batch_size,
    );

    for index in 0..metadata.total_frames {
        if options.is_cancelled() {
            log::debug!("Extraction cancelled before frame {index}");
            return Err(FrameGrabError::Cancelled);
        }

        let frame = session.frame_at(index)?;
        frame.save_with_format(run_directory.join(frame_file_name(index, format)), format)?;
        tracker.advance(index);
    }
    tracker.finish();

    log::debug!(
        "Wrote {} frames to {}",
        metadata.total_frames,
        run_directory.display()
    );
    Ok(ExtractionReport {
        run_directory,
        sidecar,
        frames_written: metadata.total_frames,
        image_format: format,
        metadata,
    })
}

/// File name of frame `index`, e.g. `frame7.png`.
pub fn frame_file_name(index: u64, format: ImageFormat) -> String {
    format!("frame{index}.{}", format.extension())
}

/// A run identifier unique within the process and, in practice, across
/// processes: UTC timestamp, process id, per-process sequence number.
pub fn generate_run_id() -> String {
    let sequence = RUN_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}-{}-{sequence}",
        Utc::now().format("%Y%m%dT%H%M%S%.6fZ"),
        std::process::id()
    )
}

/// Create a new, uniquely named directory under `root`.
///
/// Fails rather than reuse an existing directory.
///
/// # Errors
///
/// Returns [`FrameGrabError::IoError`] if the directory cannot be created.
pub fn create_run_directory(root: &Path) -> Result<PathBuf, FrameGrabError> {
    let directory = root.join(generate_run_id());
    fs::create_dir(&directory)?;
    log::debug!("Created run directory {}", directory.display());
    Ok(directory)
}

/// Render the sidecar contents for `metadata`.
pub fn sidecar_contents(metadata: &VideoStreamMetadata) -> String {
    format!(
        "{}\n{}\n{}\n{:?}\n{:?}\n",
        metadata.total_frames,
        metadata.width,
        metadata.height,
        metadata.frames_per_second(),
        metadata.duration_seconds
    )
}

/// Write `meta.txt` into `directory` and return its path.
///
/// # Errors
///
/// Returns [`FrameGrabError::IoError`] if the file cannot be written.
pub fn write_sidecar(
    directory: &Path,
    metadata: &VideoStreamMetadata,
) -> Result<PathBuf, FrameGrabError> {
    let path = directory.join(SIDECAR_FILE_NAME);
    fs::write(&path, sidecar_contents(metadata))?;
    Ok(path)
}
