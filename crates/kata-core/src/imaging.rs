//! Canonical JPEG re-encoding of uploaded images.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use tracing::debug;

use crate::error::ImageInputError;
use crate::models::config::ImageConfig;

/// Re-encode a JPEG or PNG upload as JPEG, downscaling oversized images.
pub fn to_jpeg(bytes: &[u8], config: &ImageConfig) -> Result<Vec<u8>, ImageInputError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;

    match reader.format() {
        Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) => {}
        Some(other) => {
            return Err(ImageInputError::UnsupportedFormat(format!("{:?}", other)));
        }
        None => {
            return Err(ImageInputError::UnsupportedFormat("unrecognized data".to_string()));
        }
    }

    let image = reader.decode()?;
    let image = downscale(image, config.max_dimension);

    encode_jpeg(&image, config.jpeg_quality)
}

/// Shrink the image so its longer side is at most `max_dimension`.
pub fn downscale(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width.max(height) <= max_dimension {
        return image;
    }

    debug!(
        "Downscaling {}x{} image to fit {}px",
        width, height, max_dimension
    );
    image.resize(max_dimension, max_dimension, FilterType::Lanczos3)
}

/// Encode as baseline RGB JPEG. Alpha is dropped.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageInputError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut buffer = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 120, 200, 128]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_png_becomes_jpeg() {
        let jpeg = to_jpeg(&png(32, 16), &ImageConfig::default()).unwrap();

        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (32, 16));
    }

    #[test]
    fn test_oversized_image_is_downscaled() {
        let config = ImageConfig {
            max_dimension: 100,
            ..ImageConfig::default()
        };
        let jpeg = to_jpeg(&png(400, 200), &config).unwrap();

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (100, 50));
    }

    #[test]
    fn test_unsupported_formats() {
        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";
        assert!(matches!(
            to_jpeg(gif, &ImageConfig::default()),
            Err(ImageInputError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            to_jpeg(b"hello", &ImageConfig::default()),
            Err(ImageInputError::UnsupportedFormat(_))
        ));
    }
}
