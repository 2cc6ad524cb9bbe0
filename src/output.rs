//! Canvas encoding.
//!
//! Serializes the finished canvas into the configured container format.

use crate::config::{OutputFormat, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage};

/// Maps PNG quality (1..=9) onto encoder effort; higher quality compresses less.
const fn png_compression(quality: u8) -> CompressionType {
    match 9_u8.saturating_sub(quality) {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Encodes `canvas` as `format`.
///
/// WebP output is lossless; its quality value is accepted but has no effect.
///
/// # Errors
///
/// Returns `Image` if the encoder fails.
pub fn encode(canvas: &RgbImage, format: OutputFormat) -> Result<Vec<u8>> {
    let (width, height) = canvas.dimensions();
    let mut buf = Vec::new();
    match format {
        OutputFormat::Png { quality } => {
            PngEncoder::new_with_quality(&mut buf, png_compression(quality), FilterType::Adaptive)
                .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgb8)?;
        }
        OutputFormat::Jpeg { quality } => {
            JpegEncoder::new_with_quality(&mut buf, quality).write_image(
                canvas.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
        OutputFormat::Gif => {
            let rgba = DynamicImage::ImageRgb8(canvas.clone()).to_rgba8();
            let mut encoder = GifEncoder::new(&mut buf);
            encoder.encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)?;
        }
        OutputFormat::WebP { .. } => {
            WebPEncoder::new_lossless(&mut buf).encode(
                canvas.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
    }
    Ok(buf)
}

/// Wraps encoded bytes into a `data:` URI.
#[must_use]
pub fn data_uri(bytes: &[u8], format: OutputFormat) -> String {
    format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn canvas() -> RgbImage {
        RgbImage::from_fn(32, 16, |x, y| Rgb([(x * 8) as u8, (y * 16) as u8, 128]))
    }

    #[test]
    fn test_magic_bytes() {
        let png = encode(&canvas(), OutputFormat::png(9)).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");

        let jpeg = encode(&canvas(), OutputFormat::jpeg(70)).unwrap();
        assert_eq!(&jpeg[..2], b"\xFF\xD8");

        let gif = encode(&canvas(), OutputFormat::Gif).unwrap();
        assert_eq!(&gif[..4], b"GIF8");

        let webp = encode(&canvas(), OutputFormat::webp(100)).unwrap();
        assert_eq!(&webp[..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn test_png_round_trip_dimensions() {
        let png = encode(&canvas(), OutputFormat::png(1)).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded, canvas());
    }

    #[test]
    fn test_webp_is_lossless_for_any_quality() {
        let low = encode(&canvas(), OutputFormat::webp(1)).unwrap();
        let high = encode(&canvas(), OutputFormat::webp(100)).unwrap();
        assert_eq!(low, high);

        let decoded = image::load_from_memory(&low).unwrap().to_rgb8();
        assert_eq!(decoded, canvas());
    }

    #[test]
    fn test_png_compression_mapping() {
        assert_eq!(png_compression(9), CompressionType::Fast);
        assert_eq!(png_compression(6), CompressionType::Default);
        assert_eq!(png_compression(1), CompressionType::Best);
    }

    #[test]
    fn test_data_uri_prefix() {
        let uri = data_uri(b"abc", OutputFormat::webp(50));
        assert_eq!(uri, "data:image/webp;base64,YWJj");
    }
}
