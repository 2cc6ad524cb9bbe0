//! Fitting the laid-out mask into the canvas width.

use super::layout::{Mask, PAPER, add_noise};
use crate::config::CaptchaConfig;
use image::imageops::{self, FilterType};
use rand::Rng;
use tracing::debug;

/// How the mask was fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Narrower mask placed unscaled in the horizontal centre.
    Centered { offset: u32 },
    /// Wider mask squeezed to the canvas width.
    Stretched,
}

/// Places the mask onto a `(width + 1) x (height + 1)` paper buffer.
#[derive(Debug, Clone, Copy)]
pub struct ResampleStage {
    canvas_width: u32,
    canvas_height: u32,
    white_noise_density: f64,
    black_noise_density: f64,
}

impl ResampleStage {
    #[must_use]
    pub const fn new(config: &CaptchaConfig) -> Self {
        Self {
            canvas_width: config.width(),
            canvas_height: config.height(),
            white_noise_density: config.white_noise_density(),
            black_noise_density: config.black_noise_density(),
        }
    }

    /// Fits the first `rendered_width` columns of `mask` into the canvas width.
    ///
    /// Noise goes onto whichever buffer has canvas-scale pixels: the mask
    /// before centring, or the output after stretching.
    pub fn fit(&self, mut mask: Mask, rendered_width: u32, rng: &mut impl Rng) -> (Mask, FitMode) {
        let mut out = Mask::from_pixel(self.canvas_width + 1, self.canvas_height + 1, PAPER);
        let source_width = rendered_width.min(mask.width());
        let source_height = self.canvas_height.min(mask.height());

        let mode = if rendered_width <= self.canvas_width {
            self.add_noise(&mut mask, rng);
            let offset = (self.canvas_width - rendered_width) / 2;
            let glyphs = imageops::crop_imm(&mask, 0, 0, source_width, source_height).to_image();
            imageops::replace(&mut out, &glyphs, i64::from(offset), 0);
            FitMode::Centered { offset }
        } else {
            let glyphs = imageops::crop_imm(&mask, 0, 0, source_width, source_height).to_image();
            let stretched = imageops::resize(
                &glyphs,
                self.canvas_width,
                self.canvas_height,
                FilterType::Triangle,
            );
            imageops::replace(&mut out, &stretched, 0, 0);
            self.add_noise(&mut out, rng);
            FitMode::Stretched
        };

        debug!(rendered_width, canvas_width = self.canvas_width, ?mode, "Mask fitted");
        (out, mode)
    }

    fn add_noise(&self, buffer: &mut Mask, rng: &mut impl Rng) {
        add_noise(
            buffer,
            self.canvas_height,
            self.white_noise_density,
            self.black_noise_density,
            rng,
        );
    }
}
