//! Atlas production from TrueType fonts.
//!
//! Rasterizes every alphabet symbol into a single strip and writes the row-0
//! marker track the decoder expects.

use crate::alphabet::Alphabet;
use crate::config::{CaptchaError, Result};
use ab_glyph::{Font, FontRef, OutlinedGlyph, point};
use image::{ImageFormat, Rgba, RgbaImage};
use tracing::debug;

/// Minimum height in pixels of the 'a' glyph at the chosen size.
const TARGET_GLYPH_HEIGHT: f32 = 35.0;
const MAX_PX_SIZE: u16 = 512;
const LEFT_MARGIN: u32 = 5;
const GLYPH_GAP: u32 = 10;
const BOTTOM_PADDING: u32 = 5;
/// Extra columns reserved around each outlined glyph.
const OUTLINE_PADDING: u32 = 4;
/// Coverage at which an antialiased pixel counts as ink.
const INK_COVERAGE: f32 = 0.5;

const OPAQUE: Rgba<u8> = Rgba([0, 0, 0, 255]);
const HALO: Rgba<u8> = Rgba([0, 0, 0, 128]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Glyph pixel content variant. The marker track is identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasStyle {
    /// Antialiased ink only.
    Plain,
    /// Hollow glyph: solid 3x3 dilation ring plus a semi-transparent halo.
    Outline,
}

struct GlyphBox {
    glyph: OutlinedGlyph,
    width: u32,
}

fn outline(font: &impl Font, symbol: char, px: f32) -> Result<OutlinedGlyph> {
    let glyph = font
        .glyph_id(symbol)
        .with_scale_and_position(px, point(0.0, 0.0));
    font.outline_glyph(glyph)
        .ok_or_else(|| CaptchaError::Font(format!("font has no outline for '{symbol}'")))
}

/// Smallest whole pixel size at which 'a' is taller than the target height.
fn pick_size(font: &impl Font) -> Result<f32> {
    for size in 1..=MAX_PX_SIZE {
        let px = f32::from(size);
        let bounds = outline(font, 'a', px)?.px_bounds();
        if bounds.height() > TARGET_GLYPH_HEIGHT {
            return Ok(px);
        }
    }
    Err(CaptchaError::Font(format!(
        "glyph 'a' stays below {TARGET_GLYPH_HEIGHT}px up to size {MAX_PX_SIZE}"
    )))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ceil_px(value: f32) -> u32 {
    value.max(0.0).ceil() as u32
}

/// Renders the alphabet of `font` into an atlas image.
///
/// # Errors
///
/// Returns `Font` if the font lacks an outline for any alphabet symbol.
pub fn encode(font: &impl Font, style: AtlasStyle) -> Result<RgbaImage> {
    let px = pick_size(font)?;
    let padding = match style {
        AtlasStyle::Plain => 0,
        AtlasStyle::Outline => OUTLINE_PADDING,
    };

    let mut boxes = Vec::with_capacity(Alphabet::LEN);
    let mut ascent = 0_u32;
    let mut descent = 0_u32;
    let mut width = 0_u32;
    for symbol in Alphabet.symbols() {
        let glyph = outline(font, symbol, px)?;
        let bounds = glyph.px_bounds();
        let glyph_width = ceil_px(bounds.width()) + padding;
        ascent = ascent.max(ceil_px(-bounds.min.y));
        descent = descent.max(ceil_px(bounds.max.y));
        width += glyph_width + GLYPH_GAP;
        boxes.push(GlyphBox {
            glyph,
            width: glyph_width,
        });
    }

    let height = 1 + ascent + descent + BOTTOM_PADDING;
    let baseline = 1 + ascent;
    let mut img = RgbaImage::from_pixel(width, height, CLEAR);
    debug!(px, width, height, ?style, "Encoding font atlas");

    let mut x = LEFT_MARGIN;
    for glyph_box in &boxes {
        for column in x..x + glyph_box.width {
            img.put_pixel(column, 0, OPAQUE);
        }
        let coverage = rasterize(&glyph_box.glyph, glyph_box.width, height, baseline, padding / 2);
        match style {
            AtlasStyle::Plain => paint_plain(&mut img, &coverage, x, glyph_box.width),
            AtlasStyle::Outline => paint_outline(&mut img, &coverage, x, glyph_box.width),
        }
        x += glyph_box.width + GLYPH_GAP;
    }

    Ok(img)
}

/// Encodes the atlas of the TrueType font in `ttf` as PNG bytes.
///
/// # Errors
///
/// Returns `Font` for unparseable font data and `Image` if PNG encoding fails.
pub fn encode_png(ttf: &[u8], style: AtlasStyle) -> Result<Vec<u8>> {
    let font = FontRef::try_from_slice(ttf).map_err(|e| CaptchaError::Font(e.to_string()))?;
    let img = encode(&font, style)?;
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Per-pixel coverage of one glyph cell, `width` by `height`, row-major.
fn rasterize(glyph: &OutlinedGlyph, width: u32, height: u32, baseline: u32, inset: u32) -> Vec<f32> {
    let bounds = glyph.px_bounds();
    let mut coverage = vec![0.0_f32; (width * height) as usize];
    #[allow(clippy::cast_possible_truncation)]
    let top = i64::from(baseline) + bounds.min.y.floor() as i64;
    glyph.draw(|gx, gy, c| {
        let cx = gx + inset;
        let cy = top + i64::from(gy);
        if cx < width && cy >= 1 && cy < i64::from(height) {
            let idx = usize::try_from(cy).unwrap_or(0) * width as usize + cx as usize;
            coverage[idx] = coverage[idx].max(c);
        }
    });
    coverage
}

fn paint_plain(img: &mut RgbaImage, coverage: &[f32], x: u32, width: u32) {
    for (i, &c) in coverage.iter().enumerate() {
        if c <= 0.0 {
            continue;
        }
        let (cx, cy) = cell_coords(i, width);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let alpha = (c.min(1.0) * 255.0).round() as u8;
        img.put_pixel(x + cx, cy, Rgba([0, 0, 0, alpha]));
    }
}

fn put_clipped(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    // Row 0 belongs to the marker track.
    if y >= 1
        && let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y))
        && x < img.width()
        && y < img.height()
    {
        img.put_pixel(x, y, color);
    }
}

fn paint_outline(img: &mut RgbaImage, coverage: &[f32], x: u32, width: u32) {
    let ink: Vec<(u32, u32)> = coverage
        .iter()
        .enumerate()
        .filter(|(_, c)| **c >= INK_COVERAGE)
        .map(|(i, _)| cell_coords(i, width))
        .collect();

    for &(cx, cy) in &ink {
        let px = i64::from(x + cx);
        let py = i64::from(cy);
        put_clipped(img, px - 2, py, HALO);
        put_clipped(img, px + 2, py, HALO);
        for dx in -1..=1 {
            for dy in -1..=1 {
                put_clipped(img, px + dx, py + dy, OPAQUE);
            }
        }
    }
    for &(cx, cy) in &ink {
        put_clipped(img, i64::from(x + cx), i64::from(cy), CLEAR);
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn cell_coords(index: usize, width: u32) -> (u32, u32) {
    let w = width as usize;
    ((index % w) as u32, (index / w) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::atlas::decode;
    use crate::font::bundled::SANS_BOLD;

    fn sans() -> FontRef<'static> {
        FontRef::try_from_slice(SANS_BOLD).unwrap()
    }

    #[test]
    fn test_pick_size_exceeds_target() {
        let font = sans();
        let px = pick_size(&font).unwrap();
        let a = outline(&font, 'a', px).unwrap().px_bounds();
        assert!(a.height() > TARGET_GLYPH_HEIGHT);
        let smaller = outline(&font, 'a', px - 1.0).unwrap().px_bounds();
        assert!(smaller.height() <= TARGET_GLYPH_HEIGHT);
    }

    #[test]
    fn test_plain_atlas_decodes_full_alphabet() {
        let img = encode(&sans(), AtlasStyle::Plain).unwrap();
        let header = decode(&img).unwrap();
        assert_eq!(header.metrics.len(), Alphabet::LEN);
        assert_eq!(header.metrics[0].start_column, LEFT_MARGIN);
        assert_eq!(header.glyph_height, img.height() - 1);
        for pair in header.metrics.windows(2) {
            assert_eq!(pair[1].start_column - pair[0].end_column, GLYPH_GAP);
        }
    }

    #[test]
    fn test_outline_shares_marker_format() {
        let plain = decode(&encode(&sans(), AtlasStyle::Plain).unwrap()).unwrap();
        let outlined_img = encode(&sans(), AtlasStyle::Outline).unwrap();
        let outlined = decode(&outlined_img).unwrap();
        assert_eq!(outlined.metrics.len(), Alphabet::LEN);
        for (p, o) in plain.metrics.iter().zip(&outlined.metrics) {
            assert_eq!(p.symbol, o.symbol);
            assert_eq!(o.width(), p.width() + OUTLINE_PADDING);
        }
        let halo = outlined_img.pixels().any(|p| p[3] == HALO[3]);
        assert!(halo);
    }

    #[test]
    fn test_glyph_ink_present() {
        let img = encode(&sans(), AtlasStyle::Plain).unwrap();
        let header = decode(&img).unwrap();
        for metric in &header.metrics {
            let inked = (metric.start_column..metric.end_column)
                .any(|x| (1..img.height()).any(|y| img.get_pixel(x, y)[3] > 0));
            assert!(inked, "glyph '{}' has no ink", metric.symbol);
        }
    }

    #[test]
    fn test_encode_png_rejects_garbage() {
        assert!(matches!(
            encode_png(b"not a font", AtlasStyle::Plain),
            Err(CaptchaError::Font(_))
        ));
        let png = encode_png(SANS_BOLD, AtlasStyle::Plain).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }
}
