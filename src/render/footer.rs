//! Credit footer.

use crate::config::Color;
use crate::font::bundled::footer_font;
use ab_glyph::PxScale;
use image::RgbImage;
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

pub const FOOTER_HEIGHT: u32 = 12;
const FOOTER_TEXT_SCALE: f32 = 11.0;

/// Fills the bottom band with `foreground` and centres `credits` on it in
/// `background`.
pub fn draw_credits(canvas: &mut RgbImage, credits: &str, foreground: Color, background: Color) {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let band_top = i32::try_from(height.saturating_sub(FOOTER_HEIGHT)).unwrap_or(0);
    let band_height = FOOTER_HEIGHT.min(height);
    draw_filled_rect_mut(
        canvas,
        Rect::at(0, band_top).of_size(width, band_height),
        foreground.to_rgb(),
    );

    let scale = PxScale::from(FOOTER_TEXT_SCALE);
    let font = footer_font();
    let (text_width, _) = text_size(scale, font, credits);
    let x = (i64::from(width) - i64::from(text_width)) / 2;
    draw_text_mut(
        canvas,
        background.to_rgb(),
        i32::try_from(x).unwrap_or(0),
        band_top,
        scale,
        font,
        credits,
    );
}
