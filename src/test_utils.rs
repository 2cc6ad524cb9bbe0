//! Test utilities and shared fixtures.
//!
//! This module provides synthetic atlases and configurations for unit and
//! integration tests, so tests do not depend on font rasterization.

#[cfg(any(test, feature = "testing"))]
use crate::config::{CaptchaConfig, Color};
#[cfg(any(test, feature = "testing"))]
use crate::font::FontAtlas;
#[cfg(any(test, feature = "testing"))]
use image::{Rgba, RgbaImage};
#[cfg(any(test, feature = "testing"))]
use std::sync::Arc;

/// Left margin before the first glyph of a synthetic atlas.
#[cfg(any(test, feature = "testing"))]
pub const SYNTHETIC_MARGIN: u32 = 5;

/// Gap between glyphs of a synthetic atlas.
#[cfg(any(test, feature = "testing"))]
pub const SYNTHETIC_GAP: u32 = 10;

/// Builds an atlas image whose glyphs are solid black blocks.
///
/// Glyph `i` is `widths[i]` columns wide and `glyph_height` rows tall, with
/// the matching run of opaque markers on row 0.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn synthetic_atlas_image(widths: &[u32], glyph_height: u32) -> RgbaImage {
    let width = SYNTHETIC_MARGIN + widths.iter().map(|w| w + SYNTHETIC_GAP).sum::<u32>();
    let mut image = RgbaImage::from_pixel(width, glyph_height + 1, Rgba([0, 0, 0, 0]));
    let mut x = SYNTHETIC_MARGIN;
    for &w in widths {
        for column in x..x + w {
            for row in 0..=glyph_height {
                image.put_pixel(column, row, Rgba([0, 0, 0, 255]));
            }
        }
        x += w + SYNTHETIC_GAP;
    }
    image
}

/// Full 36-glyph synthetic atlas with uniform glyph widths.
///
/// # Panics
///
/// Panics if the synthetic image fails to decode, which indicates a broken
/// fixture.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn synthetic_atlas(glyph_width: u32, glyph_height: u32) -> Arc<FontAtlas> {
    let image = synthetic_atlas_image(&[glyph_width; 36], glyph_height);
    Arc::new(FontAtlas::decode("synthetic", image).expect("synthetic atlas must decode"))
}

/// Creates a deterministic configuration for testing purposes.
///
/// This configuration has:
/// - 160x80 canvas
/// - White background, black foreground
/// - No noise
/// - A single synthetic atlas (12x30 glyph blocks)
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub fn create_test_config() -> CaptchaConfig {
    CaptchaConfig::default()
        .with_font(synthetic_atlas(12, 30), true)
        .with_background_color(255, 255, 255)
        .with_foreground_color(0, 0, 0)
        .with_white_noise_density(0.0)
        .with_black_noise_density(0.0)
}

/// Black and white as resolved colours.
#[cfg(any(test, feature = "testing"))]
#[must_use]
pub const fn black_and_white() -> (Color, Color) {
    (Color::new(0, 0, 0), Color::new(255, 255, 255))
}
