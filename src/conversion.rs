//! Native picture to packed RGB conversion.
//!
//! [`FrameConverter`] turns a [`NativePicture`] into a [`DecodedFrame`]: a
//! tightly packed, 8-bit, interleaved RGB buffer covering only the visible
//! (cropped) region of the picture.

use std::{borrow::Cow, path::Path};

use image::{DynamicImage, RgbImage};

use crate::{
    colorspace,
    configuration::ImageFormat,
    error::FrameGrabError,
    picture::{CropRectangle, NativePicture},
};

/// A decoded video frame as packed RGB bytes.
///
/// `pixel_data().len()` is always `3 * width() * height()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pixel_data: Vec<u8>,
    width: u32,
    height: u32,
    index: u64,
}

impl DecodedFrame {
    /// Packed `R G B` bytes, row-major, no padding.
    pub fn pixel_data(&self) -> &[u8] {
        &self.pixel_data
    }

    /// Consume the frame and return its pixel buffer.
    pub fn into_pixel_data(self) -> Vec<u8> {
        self.pixel_data
    }

    /// Visible width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Visible height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Zero-based position of the frame in the video.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Copy the frame into an [`RgbImage`].
    ///
    /// # Errors
    ///
    /// Returns [`FrameGrabError::DecodeError`] if the buffer does not match
    /// the dimensions, which the converter never produces.
    pub fn to_image(&self) -> Result<RgbImage, FrameGrabError> {
        RgbImage::from_raw(self.width, self.height, self.pixel_data.clone()).ok_or_else(|| {
            FrameGrabError::DecodeError {
                index: self.index,
                reason: "Failed to construct RGB image from decoded frame data".to_string(),
            }
        })
    }

    /// Save the frame, inferring the image format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`FrameGrabError::ImageError`] if encoding or writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FrameGrabError> {
        self.to_image()?.save(path)?;
        Ok(())
    }

    /// Save the frame with an explicit encoder, regardless of extension.
    ///
    /// # Errors
    ///
    /// Returns [`FrameGrabError::ImageError`] if encoding or writing fails.
    pub fn save_with_format<P: AsRef<Path>>(
        &self,
        path: P,
        format: ImageFormat,
    ) -> Result<(), FrameGrabError> {
        let image = DynamicImage::ImageRgb8(self.to_image()?);
        image.save_with_format(path, format.to_image_format())?;
        Ok(())
    }
}

/// Converts native pictures into [`DecodedFrame`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameConverter;

impl FrameConverter {
    /// Create a converter.
    pub fn new() -> Self {
        Self
    }

    /// Convert `picture`, tagging the result with `index`.
    ///
    /// Non-RGB pictures are first transformed to RGB. Samples are narrowed
    /// to bytes by truncation. Without a crop rectangle the RGB plane is
    /// copied as one block; with one, rows are copied individually because
    /// the source and destination strides differ.
    ///
    /// # Errors
    ///
    /// Returns [`FrameGrabError::DecodeError`] if the planes do not match the
    /// declared layout or the crop rectangle leaves the picture.
    pub fn convert(
        &self,
        picture: &NativePicture,
        index: u64,
    ) -> Result<DecodedFrame, FrameGrabError> {
        let invalid = |reason: String| FrameGrabError::DecodeError { index, reason };

        let rgb = if picture.color_space.is_rgb() {
            Cow::Borrowed(picture)
        } else {
            Cow::Owned(colorspace::to_rgb(picture).map_err(invalid)?)
        };

        let width = rgb.width;
        let height = rgb.height;
        let plane = rgb
            .planes
            .first()
            .ok_or_else(|| invalid("RGB picture has no sample plane".to_string()))?;

        let row_bytes = width as usize * 3;
        if height > 0 && (plane.stride < row_bytes || plane.rows() < height as usize) {
            return Err(invalid(format!(
                "RGB plane with stride {} and {} rows is smaller than {width}x{height}",
                plane.stride,
                plane.rows()
            )));
        }

        let tight = plane.stride == row_bytes;
        let crop = match rgb.crop {
            Some(crop) if !crop.fits_within(width, height) => {
                return Err(invalid(format!(
                    "crop {crop:?} does not fit a {width}x{height} picture"
                )));
            }
            Some(crop) if !(tight && crop.covers(width, height)) => Some(crop),
            None if !tight => Some(CropRectangle::new(0, 0, width, height)),
            _ => None,
        };

        let shift = u32::from(rgb.bit_depth.saturating_sub(8));
        let pixel_data = match crop {
            None => copy_direct(&plane.data, row_bytes * height as usize, shift),
            Some(crop) => copy_rows(&plane.data, plane.stride, crop, shift),
        };

        let frame = DecodedFrame {
            pixel_data,
            width: rgb.cropped_width(),
            height: rgb.cropped_height(),
            index,
        };
        log::trace!(
            "Converted frame {index} ({:?} {width}x{height}) to {}x{} RGB",
            picture.color_space,
            frame.width,
            frame.height
        );
        Ok(frame)
    }
}

/// Same layout on both sides: copy the whole plane in one pass.
fn copy_direct(samples: &[u16], length: usize, shift: u32) -> Vec<u8> {
    samples[..length].iter().map(|&sample| narrow(sample, shift)).collect()
}

/// Copy `crop.height` rows of `crop.width * 3` samples, starting at the crop
/// origin, from a plane with `source_stride` samples per row.
fn copy_rows(samples: &[u16], source_stride: usize, crop: CropRectangle, shift: u32) -> Vec<u8> {
    let destination_stride = crop.width as usize * 3;
    let mut buffer = Vec::with_capacity(destination_stride * crop.height as usize);
    for row in 0..crop.height as usize {
        let row_start = (crop.y as usize + row) * source_stride + crop.x as usize * 3;
        buffer.extend(
            samples[row_start..row_start + destination_stride]
                .iter()
                .map(|&sample| narrow(sample, shift)),
        );
    }
    buffer
}

/// Drop the low `shift` bits, then keep the low byte.
fn narrow(sample: u16, shift: u32) -> u8 {
    (sample >> shift) as u8
}

#[cfg(test)]
mod tests {
    use super::FrameConverter;
    use crate::picture::{ColorRange, ColorSpace, CropRectangle, NativePicture, Plane};

    #[test]
    fn samples_are_truncated_not_rounded() {
        let picture = NativePicture::rgb(1, 1, vec![256 + 7, 511, 0x1FF]);
        let frame = FrameConverter::new().convert(&picture, 0).unwrap();
        assert_eq!(frame.pixel_data(), &[7, 255, 255]);
    }

    #[test]
    fn high_bit_depth_rgb_drops_low_bits() {
        let picture = NativePicture::rgb(1, 1, vec![1023, 512, 3]).with_bit_depth(10);
        let frame = FrameConverter::new().convert(&picture, 0).unwrap();
        assert_eq!(frame.pixel_data(), &[255, 128, 0]);

        let cropped = NativePicture::rgb(2, 1, vec![0, 0, 0, 1023, 512, 4])
            .with_bit_depth(10)
            .with_crop(CropRectangle::new(1, 0, 1, 1));
        let frame = FrameConverter::new().convert(&cropped, 0).unwrap();
        assert_eq!(frame.pixel_data(), &[255, 128, 1]);
    }

    #[test]
    fn full_picture_crop_takes_the_direct_path() {
        let samples: Vec<u16> = (0..2 * 2 * 3).collect();
        let picture = NativePicture::rgb(2, 2, samples.clone()).with_crop(CropRectangle::new(0, 0, 2, 2));
        let frame = FrameConverter::new().convert(&picture, 3).unwrap();
        let expected: Vec<u8> = samples.iter().map(|&s| s as u8).collect();
        assert_eq!(frame.pixel_data(), expected.as_slice());
        assert_eq!(frame.index(), 3);
    }

    #[test]
    fn padded_stride_without_crop_is_copied_row_by_row() {
        let picture = NativePicture::new(
            ColorSpace::Rgb,
            1,
            2,
            vec![Plane::new(vec![1, 2, 3, 0, 4, 5, 6, 0], 4)],
        );
        let frame = FrameConverter::new().convert(&picture, 0).unwrap();
        assert_eq!(frame.pixel_data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn crop_outside_the_picture_is_a_decode_error() {
        let picture = NativePicture::rgb(2, 2, vec![0; 12]).with_crop(CropRectangle::new(1, 1, 2, 2));
        let error = FrameConverter::new().convert(&picture, 9).unwrap_err();
        assert!(matches!(error, crate::FrameGrabError::DecodeError { index: 9, .. }));
    }

    #[test]
    fn yuv_crop_survives_the_colour_transform() {
        let picture = NativePicture::new(
            ColorSpace::Yuv444(ColorRange::Full),
            2,
            1,
            vec![
                Plane::new(vec![10, 200], 2),
                Plane::new(vec![128, 128], 2),
                Plane::new(vec![128, 128], 2),
            ],
        )
        .with_crop(CropRectangle::new(1, 0, 1, 1));
        let frame = FrameConverter::new().convert(&picture, 0).unwrap();
        assert_eq!((frame.width(), frame.height()), (1, 1));
        assert_eq!(frame.pixel_data(), &[200, 200, 200]);
    }

    #[test]
    fn frame_becomes_an_rgb_image() {
        let picture = NativePicture::rgb(2, 1, vec![255, 0, 0, 0, 0, 255]);
        let frame = FrameConverter::new().convert(&picture, 0).unwrap();
        let image = frame.to_image().unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0, 255]);
    }
}
