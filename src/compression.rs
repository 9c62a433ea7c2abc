//! JPEG compression of rendered frames.

use image::{DynamicImage, codecs::jpeg::JpegEncoder};

use crate::error::FrameBarError;

/// Compress `image` to a JPEG byte buffer at `quality` (clamped to 1–100).
///
/// JPEG has no alpha channel, so anything other than grayscale or RGB is
/// flattened to RGB first.
///
/// ```
/// use image::{DynamicImage, RgbImage};
///
/// let image = DynamicImage::ImageRgb8(RgbImage::new(16, 9));
/// let bytes = framebar::compress_jpeg(&image, 5).unwrap();
/// assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
/// ```
pub fn compress_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, FrameBarError> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));

    let result = match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => {
            image.write_with_encoder(encoder)
        }
        other => DynamicImage::ImageRgb8(other.to_rgb8()).write_with_encoder(encoder),
    };
    result.map_err(|error| FrameBarError::ImageEncodeError(error.to_string()))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use image::{ImageFormat, Rgb, RgbImage, RgbaImage};

    use super::*;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7) as u8, (y * 5) as u8, ((x + y) * 3) as u8])
        }))
    }

    #[test]
    fn output_decodes_with_same_dimensions() {
        let bytes = compress_jpeg(&gradient(64, 36), 5).expect("encode");
        assert_eq!(image::guess_format(&bytes).expect("format"), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (64, 36));
    }

    #[test]
    fn low_quality_is_smaller() {
        let image = gradient(160, 90);
        let small = compress_jpeg(&image, 5).expect("encode");
        let large = compress_jpeg(&image, 95).expect("encode");
        assert!(small.len() < large.len());
    }

    #[test]
    fn alpha_is_flattened() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(8, 8));
        assert!(compress_jpeg(&image, 50).is_ok());
    }
}
