//! Native decoder output.
//!
//! A [`NativePicture`] is what a [`FormatAdapter`](crate::FormatAdapter)
//! hands to the [`FrameConverter`](crate::FrameConverter): one or more sample
//! planes in the decoder's working colour space, the nominal dimensions of
//! the decoded buffer, and an optional crop rectangle marking the visually
//! valid region. Pictures are produced per decode call and consumed
//! immediately.

/// Luma/chroma sample range of a YUV picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorRange {
    /// Studio swing: luma in `16..=235`, chroma in `16..=240`.
    #[default]
    Limited,
    /// Full swing: every component uses the whole sample range.
    Full,
}

/// Colour space and plane layout of a [`NativePicture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// One packed plane, `R G B` per pixel.
    Rgb,
    /// One packed plane, `B G R` per pixel.
    Bgr,
    /// Three planes, chroma subsampled 2×2.
    Yuv420(ColorRange),
    /// Three planes, chroma subsampled horizontally.
    Yuv422(ColorRange),
    /// Three full-resolution planes.
    Yuv444(ColorRange),
    /// One luma plane.
    Gray,
}

impl ColorSpace {
    /// Number of planes a picture in this colour space carries.
    pub fn plane_count(self) -> usize {
        match self {
            ColorSpace::Rgb | ColorSpace::Bgr | ColorSpace::Gray => 1,
            ColorSpace::Yuv420(_) | ColorSpace::Yuv422(_) | ColorSpace::Yuv444(_) => 3,
        }
    }

    /// Horizontal and vertical chroma shift (`log2` of the subsampling
    /// factor). `(0, 0)` for spaces without chroma planes.
    pub fn chroma_shift(self) -> (u32, u32) {
        match self {
            ColorSpace::Yuv420(_) => (1, 1),
            ColorSpace::Yuv422(_) => (1, 0),
            _ => (0, 0),
        }
    }

    /// `true` for the packed RGB layout the converter emits.
    pub fn is_rgb(self) -> bool {
        matches!(self, ColorSpace::Rgb)
    }
}

/// One sample plane. `stride` is measured in samples, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    /// Row-major samples; row `r` starts at `r * stride`.
    pub data: Vec<u16>,
    /// Samples per row, including any padding.
    pub stride: usize,
}

impl Plane {
    /// Create a plane from row-major samples.
    pub fn new(data: Vec<u16>, stride: usize) -> Self {
        Self { data, stride }
    }

    /// Number of complete rows held by the plane.
    pub fn rows(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        }
    }
}

/// The visually valid sub-region of a decoded picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropRectangle {
    /// Left edge, in pixels.
    pub x: u32,
    /// Top edge, in pixels.
    pub y: u32,
    /// Visible width, in pixels.
    pub width: u32,
    /// Visible height, in pixels.
    pub height: u32,
}

impl CropRectangle {
    /// Create a crop rectangle.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle lies entirely inside a `width`×`height` picture.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }

    /// Whether the rectangle covers the whole `width`×`height` picture.
    pub fn covers(&self, width: u32, height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == width && self.height == height
    }
}

/// A decoded picture in the decoder's native representation.
#[derive(Debug, Clone, PartialEq)]
pub struct NativePicture {
    /// Sample planes, in the order [`ColorSpace`] implies (`Y`, `U`, `V` for
    /// YUV spaces).
    pub planes: Vec<Plane>,
    /// Colour space of the samples.
    pub color_space: ColorSpace,
    /// Nominal width of the decoded buffer, in pixels.
    pub width: u32,
    /// Nominal height of the decoded buffer, in pixels.
    pub height: u32,
    /// Significant bits per sample (8 for most H.264 content).
    pub bit_depth: u8,
    /// Visible region, when it differs from the nominal buffer.
    pub crop: Option<CropRectangle>,
}

impl NativePicture {
    /// Create an 8-bit picture without a crop rectangle.
    pub fn new(color_space: ColorSpace, width: u32, height: u32, planes: Vec<Plane>) -> Self {
        Self {
            planes,
            color_space,
            width,
            height,
            bit_depth: 8,
            crop: None,
        }
    }

    /// Create an 8-bit packed RGB picture with a tight stride.
    pub fn rgb(width: u32, height: u32, samples: Vec<u16>) -> Self {
        let stride = width as usize * 3;
        Self::new(ColorSpace::Rgb, width, height, vec![Plane::new(samples, stride)])
    }

    /// Attach a crop rectangle.
    #[must_use]
    pub fn with_crop(mut self, crop: CropRectangle) -> Self {
        self.crop = Some(crop);
        self
    }

    /// Set the significant bits per sample.
    #[must_use]
    pub fn with_bit_depth(mut self, bit_depth: u8) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    /// Visible width: the crop width, or the nominal width without a crop.
    pub fn cropped_width(&self) -> u32 {
        self.crop.map_or(self.width, |crop| crop.width)
    }

    /// Visible height: the crop height, or the nominal height without a crop.
    pub fn cropped_height(&self) -> u32 {
        self.crop.map_or(self.height, |crop| crop.height)
    }
}
