//! Captcha generation.
//!
//! Validates the text, runs layout, resampling and distortion in sequence,
//! adds the optional footer, and encodes the result.

use crate::alphabet::Alphabet;
use crate::config::{CaptchaConfig, CaptchaError, Color, Result};
use crate::output;
use crate::render::{DisplacementField, GlyphLayoutEngine, ResampleStage, composite, draw_credits};
use image::RgbImage;
use rand::Rng;
use tracing::{debug, warn};

/// Renders captcha images for a fixed configuration.
///
/// The generator holds no mutable state; one instance can serve concurrent
/// callers, each supplying its own random source.
#[derive(Debug, Clone, Default)]
pub struct CaptchaGenerator {
    config: CaptchaConfig,
}

impl CaptchaGenerator {
    #[must_use]
    pub const fn new(config: CaptchaConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &CaptchaConfig {
        &self.config
    }

    /// Renders `text` and encodes it in the configured format, using the
    /// thread-local random source.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCharacters` if `text` is empty or contains symbols
    /// outside the alphabet, `InvalidConfiguration` for unusable settings,
    /// `MalformedAtlas` if the chosen atlas lacks a glyph, and `Image` if
    /// encoding fails.
    pub fn generate(&self, text: &str) -> Result<Vec<u8>> {
        self.generate_with_rng(text, &mut rand::rng())
    }

    /// Same as [`Self::generate`] with an explicit random source.
    ///
    /// # Errors
    ///
    /// See [`Self::generate`].
    pub fn generate_with_rng(&self, text: &str, rng: &mut impl Rng) -> Result<Vec<u8>> {
        let canvas = self.render(text, rng)?;
        output::encode(&canvas, self.config.output())
    }

    /// Renders `text` and returns it as a base64 `data:` URI.
    ///
    /// # Errors
    ///
    /// See [`Self::generate`].
    pub fn generate_data_uri(&self, text: &str) -> Result<String> {
        let bytes = self.generate(text)?;
        Ok(output::data_uri(&bytes, self.config.output()))
    }

    /// Renders `text` into an unencoded canvas.
    ///
    /// # Errors
    ///
    /// See [`Self::generate`]; never returns `Image`.
    pub fn render(&self, text: &str, rng: &mut impl Rng) -> Result<RgbImage> {
        let alphabet = Alphabet;
        let Some(text) = alphabet.normalize(text) else {
            warn!(len = text.chars().count(), "Rejected captcha text");
            return Err(CaptchaError::UnsupportedCharacters {
                allowed: alphabet.as_str().to_string(),
            });
        };
        self.config.validate()?;

        let (width, height) = (self.config.width(), self.config.height());
        let (mask, rendered_width) = GlyphLayoutEngine::new(&self.config).layout(&text, rng)?;
        let (mask, _) = ResampleStage::new(&self.config).fit(mask, rendered_width, rng);

        let foreground = self
            .config
            .foreground()
            .unwrap_or_else(|| Color::random_foreground(rng));
        let background = self
            .config
            .background()
            .unwrap_or_else(|| Color::random_background(rng));

        let field = DisplacementField::random(rng);
        debug!(?field, ?foreground, ?background, "Compositing captcha");
        let mut canvas = composite(&mask, &field, foreground, background, width, height);

        if let Some(credits) = self.config.credits() {
            draw_credits(&mut canvas, credits, foreground, background);
        }
        Ok(canvas)
    }
}
