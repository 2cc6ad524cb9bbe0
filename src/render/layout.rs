//! Glyph layout.
//!
//! Places glyphs on a staircase with random vertical jitter, copies them into
//! a grayscale mask, and injects point noise.

use crate::config::{CaptchaConfig, CaptchaError, Result};
use crate::font::FontAtlas;
use image::{GrayImage, Luma};
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

/// Intermediate glyph silhouette: 255 is paper, 0 is ink.
pub type Mask = GrayImage;

pub const PAPER: Luma<u8> = Luma([u8::MAX]);
pub const INK: Luma<u8> = Luma([0]);

/// Placement of one glyph in the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutStep {
    pub dest_x: i64,
    pub dest_y: i64,
    pub src_start_column: u32,
    pub src_width: u32,
}

/// Planned placements plus the width they span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub steps: Vec<LayoutStep>,
    pub width: u32,
}

/// Lays text out into a mask using one of the configured atlases.
#[derive(Debug, Clone, Copy)]
pub struct GlyphLayoutEngine<'a> {
    fonts: &'a [Arc<FontAtlas>],
    amplitude: u32,
    spaces: bool,
    canvas_height: u32,
}

impl<'a> GlyphLayoutEngine<'a> {
    #[must_use]
    pub fn new(config: &'a CaptchaConfig) -> Self {
        Self {
            fonts: config.fonts(),
            amplitude: config.fluctuation_amplitude(),
            spaces: config.spaces(),
            canvas_height: config.height(),
        }
    }

    /// Picks one atlas uniformly at random.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if no atlas is configured.
    pub fn choose_atlas(&self, rng: &mut impl Rng) -> Result<&'a Arc<FontAtlas>> {
        if self.fonts.is_empty() {
            return Err(CaptchaError::InvalidConfiguration(
                "no font atlas configured".to_string(),
            ));
        }
        Ok(&self.fonts[rng.random_range(0..self.fonts.len())])
    }

    /// Computes glyph placements for `text`.
    ///
    /// Glyphs alternate up and down around the vertical centre by half the
    /// amplitude, with an extra random offset of up to a third of it. Without
    /// spacing, consecutive glyphs overlap by one column; with spacing they are
    /// pushed apart by 3 to 10 columns.
    ///
    /// # Errors
    ///
    /// Returns `MalformedAtlas` if the atlas has no glyph for a symbol.
    pub fn plan(&self, text: &str, atlas: &FontAtlas, rng: &mut impl Rng) -> Result<Layout> {
        let amplitude = f64::from(self.amplitude);
        #[allow(clippy::cast_possible_truncation)]
        let spread = (amplitude / 3.0).round() as i64;
        let centre = (f64::from(self.canvas_height) - f64::from(atlas.glyph_height())) / 2.0;
        let odd = if rng.random_bool(0.5) { 1.0 } else { -1.0 };

        let mut cursor: i64 = 1;
        let mut steps = Vec::with_capacity(text.len());
        for (i, symbol) in text.chars().enumerate() {
            let metric = atlas.metric(symbol)?;

            let jump = (f64::from(u8::from(i % 2 == 1)) * amplitude - amplitude / 2.0) * odd;
            let offset = rng.random_range(-spread..=spread);
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            let dest_y = (jump + offset as f64 + centre) as i64;

            let shift: i64 = if self.spaces {
                rng.random_range(-10..=-3)
            } else {
                1
            };

            steps.push(LayoutStep {
                dest_x: cursor - shift,
                dest_y,
                src_start_column: metric.start_column,
                src_width: metric.width(),
            });
            cursor += i64::from(metric.width()) - shift;
        }

        Ok(Layout {
            steps,
            width: u32::try_from(cursor).unwrap_or(1),
        })
    }

    /// Copies the planned glyphs into a fresh `(width + 1) x (height + 1)` mask.
    ///
    /// Glyph pixels darken what is already there, so overlapping glyphs keep
    /// each other's ink.
    #[must_use]
    pub fn render(&self, layout: &Layout, atlas: &FontAtlas) -> Mask {
        let mut mask = Mask::from_pixel(layout.width + 1, self.canvas_height + 1, PAPER);
        let (mask_width, mask_height) = mask.dimensions();

        for step in &layout.steps {
            for sy in 0..atlas.glyph_height() {
                let dy = step.dest_y + i64::from(sy);
                let Ok(dy) = u32::try_from(dy) else {
                    continue;
                };
                if dy >= mask_height {
                    break;
                }
                for sx in 0..step.src_width {
                    let Ok(dx) = u32::try_from(step.dest_x + i64::from(sx)) else {
                        continue;
                    };
                    if dx >= mask_width {
                        break;
                    }
                    let ink = u16::from(atlas.intensity(step.src_start_column + sx, sy));
                    let pixel = mask.get_pixel_mut(dx, dy);
                    let blended = u16::from(pixel[0]) * ink / 255;
                    pixel[0] = u8::try_from(blended).unwrap_or(u8::MAX);
                }
            }
        }
        mask
    }

    /// Chooses an atlas, plans the layout, and renders the mask.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::choose_atlas`] and [`Self::plan`].
    pub fn layout(&self, text: &str, rng: &mut impl Rng) -> Result<(Mask, u32)> {
        let atlas = self.choose_atlas(rng)?;
        let layout = self.plan(text, atlas, rng)?;
        debug!(
            atlas = atlas.name(),
            rendered_width = layout.width,
            glyphs = layout.steps.len(),
            "Text laid out"
        );
        Ok((self.render(&layout, atlas), layout.width))
    }
}

/// Scatters white then black points over the band `10..=height - 15`.
///
/// Each colour gets `density * (height - 30) * buffer_width` independent point
/// writes; repeated coordinates are not avoided.
pub fn add_noise(
    mask: &mut Mask,
    canvas_height: u32,
    white_density: f64,
    black_density: f64,
    rng: &mut impl Rng,
) {
    let width = mask.width();
    let top = 10_u32;
    let bottom = canvas_height
        .saturating_sub(15)
        .min(mask.height().saturating_sub(1));
    if width == 0 || bottom < top {
        return;
    }
    let area = f64::from(canvas_height.saturating_sub(30)) * f64::from(width);

    for (density, color) in [(white_density, PAPER), (black_density, INK)] {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = (density * area).floor().max(0.0) as u64;
        for _ in 0..count {
            let x = rng.random_range(0..width);
            let y = rng.random_range(top..=bottom);
            mask.put_pixel(x, y, color);
        }
    }
}
