//! Metadata-only inspection of video files.
//!
//! [`VideoProbe`] opens a file, reads its track metadata and closes it
//! again, which is all the `framegrab metadata` command needs.

use std::path::{Path, PathBuf};

use crate::{
    adapter::open_adapter, container::ContainerFormat, error::FrameGrabError,
    metadata::VideoStreamMetadata,
};

/// What a probe learns about one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    /// The probed file.
    pub path: PathBuf,
    /// Container format detected from the file header.
    pub format: ContainerFormat,
    /// Metadata of the video track.
    pub metadata: VideoStreamMetadata,
}

/// Lightweight video probe.
///
/// # Example
///
/// ```no_run
/// use framegrab::VideoProbe;
///
/// let report = VideoProbe::probe("input.mp4")?;
/// println!("{}: {} frames", report.format, report.metadata.total_frames);
/// # Ok::<(), framegrab::FrameGrabError>(())
/// ```
pub struct VideoProbe;

impl VideoProbe {
    /// Open `path`, capture its metadata and release the file.
    ///
    /// # Errors
    ///
    /// Same as [`VideoSession::open`](crate::VideoSession::open).
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<ProbeReport, FrameGrabError> {
        let path = path.as_ref();
        let adapter = open_adapter(path)?;
        Ok(ProbeReport {
            path: path.to_path_buf(),
            format: adapter.format(),
            metadata: adapter.metadata(),
        })
    }

    /// Probe several files. A file that fails produces an `Err` entry
    /// instead of aborting the batch.
    pub fn probe_many<P: AsRef<Path>>(paths: &[P]) -> Vec<Result<ProbeReport, FrameGrabError>> {
        paths.iter().map(Self::probe).collect()
    }
}
