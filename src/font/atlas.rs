//! Font atlas decoding.
//!
//! An atlas is an RGBA strip holding every alphabet glyph side by side. Row 0
//! is a marker track: each glyph is announced by a run of opaque pixels
//! spanning exactly its columns, separated by fully transparent gaps. Glyph
//! pixel data starts at row 1.

use crate::alphabet::Alphabet;
use crate::config::{CaptchaError, Result};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// 7-bit alpha value meaning "fully transparent".
const TRANSPARENT_ALPHA: u8 = 0;

/// Horizontal pixel span of one glyph within the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphMetric {
    pub symbol: char,
    /// First column covered by the glyph.
    pub start_column: u32,
    /// One past the last column covered by the glyph.
    pub end_column: u32,
}

impl GlyphMetric {
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.end_column - self.start_column
    }
}

/// Parsed boundary track of an atlas image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasHeader {
    /// Height of glyph pixel data (image height minus the marker row).
    pub glyph_height: u32,
    /// Metrics in alphabet order, one per decoded glyph.
    pub metrics: Vec<GlyphMetric>,
}

#[inline]
fn is_transparent(pixel: &Rgba<u8>) -> bool {
    pixel[3] >> 1 == TRANSPARENT_ALPHA
}

/// Parses the marker track of `image`.
///
/// Columns are scanned left to right. A transparent-to-opaque transition opens
/// a glyph and the following opaque-to-transparent transition closes it,
/// assigning it to the next alphabet symbol. A glyph still open when the image
/// ends is discarded.
///
/// # Errors
///
/// Returns `MalformedAtlas` if the image has no glyph rows or no closed glyph.
pub fn decode(image: &RgbaImage) -> Result<AtlasHeader> {
    let (width, height) = image.dimensions();
    if height < 2 {
        return Err(CaptchaError::MalformedAtlas(format!(
            "atlas height {height} leaves no room for glyph rows"
        )));
    }

    let alphabet = Alphabet;
    let mut metrics = Vec::with_capacity(Alphabet::LEN);
    let mut open: Option<u32> = None;

    for x in 0..width {
        let Some(symbol) = alphabet.symbol(metrics.len()) else {
            break;
        };
        let transparent = is_transparent(image.get_pixel(x, 0));
        match open {
            None if !transparent => open = Some(x),
            Some(start_column) if transparent => {
                metrics.push(GlyphMetric {
                    symbol,
                    start_column,
                    end_column: x,
                });
                open = None;
            }
            _ => {}
        }
    }

    if metrics.is_empty() {
        return Err(CaptchaError::MalformedAtlas(
            "no glyph boundaries found in marker row".to_string(),
        ));
    }

    Ok(AtlasHeader {
        glyph_height: height - 1,
        metrics,
    })
}

/// Decoded atlas: glyph metrics plus the pixel source they index into.
#[derive(Debug, Clone)]
pub struct FontAtlas {
    name: String,
    header: AtlasHeader,
    pixels: RgbaImage,
}

impl FontAtlas {
    /// Decodes an atlas from an in-memory RGBA buffer.
    ///
    /// # Errors
    ///
    /// Returns `MalformedAtlas` if the marker track cannot be parsed.
    pub fn decode(name: impl Into<String>, pixels: RgbaImage) -> Result<Self> {
        let header = decode(&pixels)?;
        Ok(Self {
            name: name.into(),
            header,
            pixels,
        })
    }

    /// Decodes an atlas from encoded image bytes (PNG in practice).
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a supported image or the marker
    /// track is malformed.
    pub fn from_memory(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let pixels = image::load_from_memory(bytes)?.to_rgba8();
        Self::decode(name, pixels)
    }

    /// Loads and decodes an atlas file; the path becomes the atlas name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pixels = image::open(path)?.to_rgba8();
        Self::decode(path.display().to_string(), pixels)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn glyph_height(&self) -> u32 {
        self.header.glyph_height
    }

    #[must_use]
    pub const fn header(&self) -> &AtlasHeader {
        &self.header
    }

    #[must_use]
    pub fn metrics(&self) -> &[GlyphMetric] {
        &self.header.metrics
    }

    /// Looks up the metric for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedAtlas` if the atlas ends before `symbol`.
    pub fn metric(&self, symbol: char) -> Result<&GlyphMetric> {
        Alphabet
            .index_of(symbol)
            .and_then(|i| self.header.metrics.get(i))
            .ok_or_else(|| {
                CaptchaError::MalformedAtlas(format!(
                    "atlas '{}' has no glyph for '{symbol}' ({} glyphs decoded)",
                    self.name,
                    self.header.metrics.len()
                ))
            })
    }

    /// Checks that every symbol of `text` has a glyph.
    ///
    /// # Errors
    ///
    /// Returns `MalformedAtlas` for the first missing symbol.
    pub fn require(&self, text: &str) -> Result<()> {
        text.chars().try_for_each(|c| self.metric(c).map(|_| ()))
    }

    /// Ink intensity at atlas glyph coordinate `(x, y)`, where `y` is relative
    /// to the first glyph row.
    ///
    /// The pixel is composited over white; 255 is paper, 0 is solid ink.
    #[must_use]
    pub fn intensity(&self, x: u32, y: u32) -> u8 {
        let Some(px) = self.pixels.get_pixel_checked(x, y + 1) else {
            return u8::MAX;
        };
        let alpha = u32::from(px[3]);
        let ink = (u32::from(px[0]) + u32::from(px[1]) + u32::from(px[2])) / 3;
        let value = (ink * alpha + 255 * (255 - alpha)) / 255;
        u8::try_from(value).unwrap_or(u8::MAX)
    }

    #[must_use]
    pub const fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::synthetic_atlas_image;

    #[test]
    fn test_decode_metrics_in_order() {
        let image = synthetic_atlas_image(&[4, 6, 5], 20);
        let header = decode(&image).unwrap();
        assert_eq!(header.glyph_height, 20);
        assert_eq!(header.metrics.len(), 3);
        assert_eq!(header.metrics[0].symbol, '0');
        assert_eq!(header.metrics[1].symbol, '1');
        assert_eq!(header.metrics[2].symbol, '2');
        assert_eq!(header.metrics[0].width(), 4);
        assert_eq!(header.metrics[1].width(), 6);
        for pair in header.metrics.windows(2) {
            assert!(pair[0].end_column < pair[1].start_column);
            assert!(pair[0].start_column < pair[0].end_column);
        }
    }

    #[test]
    fn test_decode_is_idempotent() {
        let image = synthetic_atlas_image(&[3; 36], 12);
        let first = decode(&image).unwrap();
        let second = decode(&image).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.metrics.len(), 36);
        assert_eq!(first.metrics[35].symbol, 'z');
    }

    #[test]
    fn test_decode_ignores_extra_and_unclosed_runs() {
        let mut image = synthetic_atlas_image(&[2; 36], 8);
        let (width, height) = image.dimensions();
        let mut wider = RgbaImage::from_pixel(width + 10, height, Rgba([0, 0, 0, 0]));
        image::imageops::replace(&mut wider, &image, 0, 0);
        for x in width + 2..width + 5 {
            wider.put_pixel(x, 0, Rgba([0, 0, 0, 255]));
        }
        image = wider;
        let header = decode(&image).unwrap();
        assert_eq!(header.metrics.len(), 36);

        let mut open = RgbaImage::from_pixel(10, 4, Rgba([0, 0, 0, 0]));
        for x in 2..10 {
            open.put_pixel(x, 0, Rgba([0, 0, 0, 255]));
        }
        assert!(matches!(
            decode(&open),
            Err(CaptchaError::MalformedAtlas(_))
        ));
    }

    #[test]
    fn test_semi_transparent_marker_counts_as_opaque() {
        let mut image = RgbaImage::from_pixel(8, 3, Rgba([0, 0, 0, 1]));
        image.put_pixel(2, 0, Rgba([0, 0, 0, 2]));
        image.put_pixel(3, 0, Rgba([0, 0, 0, 64]));
        let header = decode(&image).unwrap();
        assert_eq!(header.metrics.len(), 1);
        assert_eq!(header.metrics[0].start_column, 2);
        assert_eq!(header.metrics[0].end_column, 4);
    }

    #[test]
    fn test_decode_rejects_flat_image() {
        let image = RgbaImage::from_pixel(10, 1, Rgba([0, 0, 0, 255]));
        assert!(matches!(
            decode(&image),
            Err(CaptchaError::MalformedAtlas(_))
        ));
    }

    #[test]
    fn test_missing_glyph_is_malformed() {
        let atlas = FontAtlas::decode("partial", synthetic_atlas_image(&[4; 12], 10)).unwrap();
        assert!(atlas.metric('a').is_ok());
        assert!(atlas.metric('b').is_ok());
        assert!(atlas.require("ab01").is_ok());
        let err = atlas.require("abc").unwrap_err();
        assert!(matches!(err, CaptchaError::MalformedAtlas(_)));
    }

    #[test]
    fn test_intensity_composites_over_white() {
        let mut image = synthetic_atlas_image(&[4], 4);
        image.put_pixel(1, 1, Rgba([0, 0, 0, 0]));
        image.put_pixel(1, 2, Rgba([0, 0, 0, 255]));
        image.put_pixel(1, 3, Rgba([0, 0, 0, 128]));
        let atlas = FontAtlas::decode("t", image).unwrap();
        assert_eq!(atlas.intensity(1, 0), 255);
        assert_eq!(atlas.intensity(1, 1), 0);
        assert_eq!(atlas.intensity(1, 2), 127);
        assert_eq!(atlas.intensity(500, 0), 255);
    }
}
