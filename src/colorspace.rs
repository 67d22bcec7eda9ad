//! Colour-space transforms into packed RGB.
//!
//! [`to_rgb`] turns a planar YUV, grayscale, or BGR [`NativePicture`] into a
//! packed RGB picture with the same nominal dimensions and crop. YUV uses
//! the ITU-R BT.601 integer approximation, with nearest-neighbour chroma
//! upsampling. Samples wider than 8 bits are narrowed by dropping their low
//! bits.

use crate::picture::{ColorRange, ColorSpace, NativePicture, Plane};

/// Transform `picture` into a packed, tightly strided RGB picture.
///
/// RGB input is returned unchanged. The error string names the plane that
/// does not match the declared layout.
pub(crate) fn to_rgb(picture: &NativePicture) -> Result<NativePicture, String> {
    validate_planes(picture)?;

    let width = picture.width as usize;
    let height = picture.height as usize;
    let shift = u32::from(picture.bit_depth.saturating_sub(8));
    let mut samples = Vec::with_capacity(width * height * 3);

    match picture.color_space {
        ColorSpace::Rgb => return Ok(picture.clone()),
        ColorSpace::Bgr => {
            let plane = &picture.planes[0];
            for row in 0..height {
                let line = &plane.data[row * plane.stride..];
                for pixel in line[..width * 3].chunks_exact(3) {
                    samples.extend_from_slice(&[pixel[2], pixel[1], pixel[0]].map(|sample| sample >> shift));
                }
            }
        }
        ColorSpace::Gray => {
            let plane = &picture.planes[0];
            for row in 0..height {
                let line = &plane.data[row * plane.stride..];
                for &luma in &line[..width] {
                    let value = luma >> shift;
                    samples.extend_from_slice(&[value, value, value]);
                }
            }
        }
        ColorSpace::Yuv420(range) | ColorSpace::Yuv422(range) | ColorSpace::Yuv444(range) => {
            let (shift_x, shift_y) = picture.color_space.chroma_shift();
            let [luma, cb, cr] = [&picture.planes[0], &picture.planes[1], &picture.planes[2]];
            for row in 0..height {
                let luma_line = &luma.data[row * luma.stride..];
                let chroma_row = row >> shift_y;
                let cb_line = &cb.data[chroma_row * cb.stride..];
                let cr_line = &cr.data[chroma_row * cr.stride..];
                for column in 0..width {
                    let chroma_column = column >> shift_x;
                    let rgb = yuv_to_rgb(
                        i32::from(luma_line[column] >> shift),
                        i32::from(cb_line[chroma_column] >> shift),
                        i32::from(cr_line[chroma_column] >> shift),
                        range,
                    );
                    samples.extend_from_slice(&rgb);
                }
            }
        }
    }

    let mut rgb = NativePicture::rgb(picture.width, picture.height, samples);
    rgb.crop = picture.crop;
    Ok(rgb)
}

/// Convert one 8-bit YUV triple to RGB, clamped to `0..=255`.
pub(crate) fn yuv_to_rgb(y: i32, u: i32, v: i32, range: ColorRange) -> [u16; 3] {
    let d = u - 128;
    let e = v - 128;
    let (r, g, b) = match range {
        ColorRange::Limited => {
            let c = 298 * (y - 16);
            (
                (c + 409 * e + 128) >> 8,
                (c - 100 * d - 208 * e + 128) >> 8,
                (c + 516 * d + 128) >> 8,
            )
        }
        ColorRange::Full => (
            y + ((359 * e + 128) >> 8),
            y - ((88 * d + 183 * e + 128) >> 8),
            y + ((454 * d + 128) >> 8),
        ),
    };
    [clamp_sample(r), clamp_sample(g), clamp_sample(b)]
}

fn clamp_sample(value: i32) -> u16 {
    value.clamp(0, 255) as u16
}

/// Check that every plane is large enough for the declared dimensions.
fn validate_planes(picture: &NativePicture) -> Result<(), String> {
    let expected = picture.color_space.plane_count();
    if picture.planes.len() < expected {
        return Err(format!(
            "{:?} picture needs {expected} planes, got {}",
            picture.color_space,
            picture.planes.len()
        ));
    }

    let width = picture.width as usize;
    let height = picture.height as usize;
    let (shift_x, shift_y) = picture.color_space.chroma_shift();
    let chroma_width = (width + (1 << shift_x) - 1) >> shift_x;
    let chroma_height = (height + (1 << shift_y) - 1) >> shift_y;

    let requirements: Vec<(usize, usize)> = match picture.color_space {
        ColorSpace::Rgb | ColorSpace::Bgr => vec![(width * 3, height)],
        ColorSpace::Gray => vec![(width, height)],
        _ => vec![
            (width, height),
            (chroma_width, chroma_height),
            (chroma_width, chroma_height),
        ],
    };

    for (index, (plane, (columns, rows))) in picture.planes.iter().zip(requirements).enumerate() {
        if !plane_fits(plane, columns, rows) {
            return Err(format!(
                "plane {index} holds {} samples with stride {}, needs {columns}x{rows}",
                plane.data.len(),
                plane.stride
            ));
        }
    }
    Ok(())
}

fn plane_fits(plane: &Plane, columns: usize, rows: usize) -> bool {
    if rows == 0 || columns == 0 {
        return true;
    }
    plane.stride >= columns && plane.data.len() >= (rows - 1) * plane.stride + columns
}

#[cfg(test)]
mod tests {
    use super::{to_rgb, yuv_to_rgb};
    use crate::picture::{ColorRange, ColorSpace, NativePicture, Plane};

    #[test]
    fn limited_range_black_and_white() {
        assert_eq!(yuv_to_rgb(16, 128, 128, ColorRange::Limited), [0, 0, 0]);
        assert_eq!(yuv_to_rgb(235, 128, 128, ColorRange::Limited), [255, 255, 255]);
    }

    #[test]
    fn full_range_gray_is_identity() {
        assert_eq!(yuv_to_rgb(0, 128, 128, ColorRange::Full), [0, 0, 0]);
        assert_eq!(yuv_to_rgb(100, 128, 128, ColorRange::Full), [100, 100, 100]);
        assert_eq!(yuv_to_rgb(255, 128, 128, ColorRange::Full), [255, 255, 255]);
    }

    #[test]
    fn limited_range_red_is_clamped() {
        // BT.601 studio-swing pure red.
        let [r, g, b] = yuv_to_rgb(81, 90, 240, ColorRange::Limited);
        assert!(r >= 250, "red channel {r}");
        assert!(g <= 5, "green channel {g}");
        assert!(b <= 5, "blue channel {b}");
    }

    #[test]
    fn yuv420_chroma_is_shared_by_two_by_two_blocks() {
        // 2x2 luma, one chroma sample: every pixel gets the same chroma.
        let picture = NativePicture::new(
            ColorSpace::Yuv420(ColorRange::Full),
            2,
            2,
            vec![
                Plane::new(vec![10, 20, 30, 40], 2),
                Plane::new(vec![128], 1),
                Plane::new(vec![128], 1),
            ],
        );
        let rgb = to_rgb(&picture).unwrap();
        assert_eq!(rgb.color_space, ColorSpace::Rgb);
        assert_eq!(
            rgb.planes[0].data,
            vec![10, 10, 10, 20, 20, 20, 30, 30, 30, 40, 40, 40]
        );
    }

    #[test]
    fn odd_dimensions_round_chroma_up() {
        let picture = NativePicture::new(
            ColorSpace::Yuv420(ColorRange::Full),
            3,
            1,
            vec![
                Plane::new(vec![50, 60, 70], 3),
                Plane::new(vec![128, 128], 2),
                Plane::new(vec![128, 128], 2),
            ],
        );
        let rgb = to_rgb(&picture).unwrap();
        assert_eq!(rgb.planes[0].data.len(), 9);
    }

    #[test]
    fn gray_with_ten_bits_drops_low_bits() {
        let picture = NativePicture::new(ColorSpace::Gray, 2, 1, vec![Plane::new(vec![1023, 4], 2)])
            .with_bit_depth(10);
        let rgb = to_rgb(&picture).unwrap();
        assert_eq!(rgb.planes[0].data, vec![255, 255, 255, 1, 1, 1]);
        assert_eq!(rgb.bit_depth, 8);
    }

    #[test]
    fn bgr_is_swizzled() {
        let picture = NativePicture::new(
            ColorSpace::Bgr,
            1,
            1,
            vec![Plane::new(vec![1, 2, 3], 3)],
        );
        assert_eq!(to_rgb(&picture).unwrap().planes[0].data, vec![3, 2, 1]);

        let deep = NativePicture::new(ColorSpace::Bgr, 1, 1, vec![Plane::new(vec![4, 512, 1023], 3)])
            .with_bit_depth(10);
        assert_eq!(to_rgb(&deep).unwrap().planes[0].data, vec![255, 128, 1]);
    }

    #[test]
    fn padded_stride_is_skipped() {
        let picture = NativePicture::new(
            ColorSpace::Gray,
            2,
            2,
            vec![Plane::new(vec![1, 2, 99, 3, 4, 99], 3)],
        );
        assert_eq!(
            to_rgb(&picture).unwrap().planes[0].data,
            vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]
        );
    }

    #[test]
    fn missing_chroma_plane_is_rejected() {
        let picture = NativePicture::new(
            ColorSpace::Yuv444(ColorRange::Limited),
            1,
            1,
            vec![Plane::new(vec![16], 1)],
        );
        let error = to_rgb(&picture).unwrap_err();
        assert!(error.contains("needs 3 planes"), "{error}");
    }

    #[test]
    fn short_plane_is_rejected() {
        let picture = NativePicture::new(ColorSpace::Gray, 4, 4, vec![Plane::new(vec![0; 8], 4)]);
        assert!(to_rgb(&picture).is_err());
    }
}
