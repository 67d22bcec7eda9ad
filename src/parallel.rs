//! Parallel extraction of several videos.
//!
//! [`extract_many`] runs one [`extract_all`] per input on the [`rayon`]
//! thread pool. Every worker opens its own session, so no decoder state is
//! shared between threads.

use std::path::{Path, PathBuf};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    configuration::ExtractOptions,
    error::FrameGrabError,
    extract::{ExtractionReport, extract_all},
};

/// Extract every frame of each input in parallel.
///
/// Results come back in input order. A failing input does not stop the
/// others; its slot holds the error. Cancelling the options' token stops
/// every run before its next frame.
///
/// # Example
///
/// ```no_run
/// use framegrab::{ExtractOptions, extract_many};
///
/// let results = extract_many(&["a.mp4", "b.mp4"], &ExtractOptions::new());
/// for (path, result) in results {
///     match result {
///         Ok(report) => println!("{}: {} frames", path.display(), report.frames_written),
///         Err(error) => eprintln!("{}: {error}", path.display()),
///     }
/// }
/// ```
pub fn extract_many<P: AsRef<Path> + Sync>(
    inputs: &[P],
    options: &ExtractOptions,
) -> Vec<(PathBuf, Result<ExtractionReport, FrameGrabError>)> {
    log::debug!("Extracting {} videos in parallel", inputs.len());
    inputs
        .par_iter()
        .map(|input| {
            let input = input.as_ref();
            if options.is_cancelled() {
                return (input.to_path_buf(), Err(FrameGrabError::Cancelled));
            }
            (input.to_path_buf(), extract_all(input, options))
        })
        .collect()
}
