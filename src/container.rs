//! Container format detection.
//!
//! [`ContainerFormat::detect`] sniffs the first bytes of a file to decide
//! which container it holds, before any demuxer is opened. Only
//! [`ContainerFormat::Mp4`] has a [`FormatAdapter`](crate::FormatAdapter);
//! the other tags exist so that rejections can name what was found.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::File,
    io::Read,
    path::Path,
};

use crate::error::FrameGrabError;

/// Number of header bytes read for sniffing. Large enough to see two
/// MPEG-TS sync bytes.
const SNIFF_LENGTH: u64 = 512;

/// ISO base media file format box types that may open an MP4/MOV file.
const ISO_BMFF_LEADING_BOXES: [&[u8; 4]; 7] =
    [b"ftyp", b"moov", b"mdat", b"free", b"skip", b"wide", b"pnot"];

const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
const TS_SYNC_BYTE: u8 = 0x47;
const TS_PACKET_SIZE: usize = 188;

/// Discrete container format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ContainerFormat {
    /// ISO base media file format (MP4, MOV, M4V, 3GP).
    Mp4,
    /// Matroska or WebM.
    Matroska,
    /// RIFF AVI.
    Avi,
    /// MPEG transport stream.
    MpegTs,
    /// Anything else.
    Unknown,
}

impl ContainerFormat {
    /// Detect the container format of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameGrabError::NotFound`] if the file does not exist or
    /// cannot be read.
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Self, FrameGrabError> {
        let path = path.as_ref();
        let not_found = |error: std::io::Error| FrameGrabError::NotFound {
            path: path.to_path_buf(),
            reason: error.to_string(),
        };

        let file = File::open(path).map_err(not_found)?;
        let mut header = Vec::with_capacity(SNIFF_LENGTH as usize);
        file.take(SNIFF_LENGTH)
            .read_to_end(&mut header)
            .map_err(not_found)?;

        let format = Self::from_header(&header);
        log::debug!("Detected {format} container at {}", path.display());
        Ok(format)
    }

    /// Classify a file from its leading bytes.
    pub fn from_header(header: &[u8]) -> Self {
        if let Some(box_type) = header.get(4..8) {
            if ISO_BMFF_LEADING_BOXES
                .iter()
                .any(|candidate| candidate.as_slice() == box_type)
            {
                return ContainerFormat::Mp4;
            }
        }

        if header.starts_with(&EBML_MAGIC) {
            return ContainerFormat::Matroska;
        }

        if header.starts_with(b"RIFF") && header.get(8..12) == Some(b"AVI ".as_slice()) {
            return ContainerFormat::Avi;
        }

        if header.first() == Some(&TS_SYNC_BYTE)
            && header.get(TS_PACKET_SIZE) == Some(&TS_SYNC_BYTE)
        {
            return ContainerFormat::MpegTs;
        }

        ContainerFormat::Unknown
    }
}

impl Display for ContainerFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::Matroska => "matroska",
            ContainerFormat::Avi => "avi",
            ContainerFormat::MpegTs => "mpegts",
            ContainerFormat::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
