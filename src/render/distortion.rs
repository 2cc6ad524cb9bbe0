//! Wave distortion compositor.
//!
//! Each canvas pixel samples the mask at a position displaced by two sums of
//! sines, one per axis and snapped to the pixel grid, and blends foreground
//! into background by the sampled ink intensity.

use super::layout::Mask;
use crate::config::Color;
use image::{Rgb, RgbImage};
use rand::Rng;
use std::f64::consts::PI;

/// Random parameters of the displacement field, drawn once per captcha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacementField {
    pub periods: [f64; 4],
    pub phases: [f64; 4],
    pub amplitudes: [f64; 2],
}

impl DisplacementField {
    pub fn random(rng: &mut impl Rng) -> Self {
        let periods = std::array::from_fn(|_| rng.random_range(0.075..=0.12));
        let phases = std::array::from_fn(|_| rng.random_range(0.0..=PI));
        let amplitudes = [rng.random_range(3.0..=3.82), rng.random_range(3.3..=4.5)];
        Self {
            periods,
            phases,
            amplitudes,
        }
    }

    /// Continuous mask coordinate sampled for canvas pixel `(x, y)`.
    #[must_use]
    pub fn source(&self, x: u32, y: u32) -> (f64, f64) {
        let (x, y) = (f64::from(x), f64::from(y));
        let [p1, p2, p3, p4] = self.periods;
        let [f1, f2, f3, f4] = self.phases;
        let [a1, a2] = self.amplitudes;
        let sx = x + ((x * p1 + f1).sin() + (y * p3 + f3).sin()) * a1 + 1.0;
        let sy = y + ((x * p2 + f2).sin() + (y * p4 + f4).sin()) * a2;
        (sx, sy)
    }
}

/// Warps `mask` onto a new `width x height` canvas filled with `background`.
///
/// The displaced position is snapped down to a whole mask pixel before
/// sampling, so partially inked neighbourhoods take the intensity of their
/// top-left pixel. Pixels whose source falls outside
/// `[0, width - 2] x [0, height - 2]` keep the background.
#[must_use]
pub fn composite(
    mask: &Mask,
    field: &DisplacementField,
    foreground: Color,
    background: Color,
    width: u32,
    height: u32,
) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(width, height, background.to_rgb());
    let max_x = f64::from(width) - 2.0;
    let max_y = f64::from(height) - 2.0;

    for x in 0..width {
        for y in 0..height {
            let (fx, fy) = field.source(x, y);
            let (sx, sy) = (fx.floor(), fy.floor());
            if sx < 0.0 || sy < 0.0 || sx > max_x || sy > max_y {
                continue;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let (ix, iy) = (sx as u32, sy as u32);
            // Weights come from the already snapped position, so they are zero.
            let (dx, dy) = (sx - sx.floor(), sy - sy.floor());
            if let Some(color) = sample(mask, ix, iy, dx, dy, foreground, background) {
                canvas.put_pixel(x, y, color);
            }
        }
    }
    canvas
}

/// Colour for a sample at `(x + dx, y + dy)`, or `None` for pure paper.
fn sample(
    mask: &Mask,
    x: u32,
    y: u32,
    dx: f64,
    dy: f64,
    foreground: Color,
    background: Color,
) -> Option<Rgb<u8>> {
    let at = |x: u32, y: u32| mask.get_pixel_checked(x, y).map_or(u8::MAX, |p| p[0]);
    let c00 = at(x, y);
    let c10 = at(x + 1, y);
    let c01 = at(x, y + 1);
    let c11 = at(x + 1, y + 1);
    let corners = [c00, c10, c01, c11];

    if corners.iter().all(|&c| c == u8::MAX) {
        return None;
    }
    if corners.iter().all(|&c| c == 0) {
        return Some(foreground.to_rgb());
    }

    let value = f64::from(c00) * (1.0 - dx) * (1.0 - dy)
        + f64::from(c10) * dx * (1.0 - dy)
        + f64::from(c01) * (1.0 - dx) * dy
        + f64::from(c11) * dx * dy;
    let t = value.min(255.0) / 255.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let blend = |fg: u8, bg: u8| ((1.0 - t) * f64::from(fg) + t * f64::from(bg)) as u8;
    Some(Rgb([
        blend(foreground.red, background.red),
        blend(foreground.green, background.green),
        blend(foreground.blue, background.blue),
    ]))
}
