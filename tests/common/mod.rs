use image::{Rgba, RgbaImage};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use wavecaptcha::{CaptchaConfig, FontAtlas};

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Atlas with solid rectangular glyphs of a fixed size.
pub fn block_atlas(glyph_width: u32, glyph_height: u32) -> Arc<FontAtlas> {
    let width = 5 + 36 * (glyph_width + 10);
    let mut image = RgbaImage::from_pixel(width, glyph_height + 1, Rgba([0, 0, 0, 0]));
    for i in 0..36 {
        let x0 = 5 + i * (glyph_width + 10);
        for x in x0..x0 + glyph_width {
            for y in 0..=glyph_height {
                image.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
    }
    Arc::new(FontAtlas::decode("blocks", image).unwrap())
}

/// Black on white, no noise, bundled fonts.
pub fn plain_config() -> CaptchaConfig {
    CaptchaConfig::default()
        .with_background_color(255, 255, 255)
        .with_foreground_color(0, 0, 0)
        .with_white_noise_density(0.0)
        .with_black_noise_density(0.0)
}
