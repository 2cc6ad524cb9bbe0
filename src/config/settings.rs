//! Configuration settings.
//!
//! Defines the immutable `CaptchaConfig` builder and environment variable
//! loading for the command-line binary.

use super::error::{CaptchaError, Result};
use crate::font::{FontAtlas, bundled};
use rand::Rng;
use std::env;
use std::sync::Arc;

/// Largest accepted canvas width or height in pixels.
pub const MAX_DIMENSION: u32 = 4096;

/// RGB colour triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Builds a colour from signed channels, clamping each into `0..=255`.
    #[must_use]
    pub fn clamped(red: i32, green: i32, blue: i32) -> Self {
        let clamp = |v: i32| u8::try_from(v.clamp(0, 255)).unwrap_or(u8::MAX);
        Self::new(clamp(red), clamp(green), clamp(blue))
    }

    /// Random light colour, each channel in `220..=255`.
    pub fn random_background(rng: &mut impl Rng) -> Self {
        Self::new(
            rng.random_range(220..=255),
            rng.random_range(220..=255),
            rng.random_range(220..=255),
        )
    }

    /// Random dark colour, each channel in `0..=80`.
    pub fn random_foreground(rng: &mut impl Rng) -> Self {
        Self::new(
            rng.random_range(0..=80),
            rng.random_range(0..=80),
            rng.random_range(0..=80),
        )
    }

    /// Parses `rgb` or `rrggbb` hex notation; `random` yields `None`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for any other input.
    pub fn parse_hex(code: &str) -> Result<Option<Self>> {
        if code.eq_ignore_ascii_case("random") {
            return Ok(None);
        }
        let invalid = || CaptchaError::InvalidConfiguration(format!("invalid color ({code})"));
        if !code.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let expanded: String = match code.len() {
            3 => code.chars().flat_map(|c| [c, c]).collect(),
            6 => code.to_string(),
            _ => return Err(invalid()),
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
        Ok(Some(Self::new(channel(0)?, channel(2)?, channel(4)?)))
    }

    #[must_use]
    pub const fn to_rgb(self) -> image::Rgb<u8> {
        image::Rgb([self.red, self.green, self.blue])
    }
}

/// Output container and its quality setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Quality 1..=9; compression effort is `9 - quality`.
    Png { quality: u8 },
    /// Quality 1..=100.
    Jpeg { quality: u8 },
    Gif,
    /// Quality 1..=100. Stored for callers, but the encoder is lossless and
    /// does not read it.
    WebP { quality: u8 },
}

impl OutputFormat {
    /// MIME subtype used in data URIs.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png { .. } => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
            Self::Gif => "image/gif",
            Self::WebP { .. } => "image/webp",
        }
    }

    /// Parses a type name with an optional quality, applying per-type defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for unknown type names.
    pub fn from_name(name: &str, quality: Option<u8>) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "png" => Ok(Self::png(quality.unwrap_or(6))),
            "jpg" | "jpeg" => Ok(Self::jpeg(quality.unwrap_or(70))),
            "gif" => Ok(Self::Gif),
            "webp" => Ok(Self::webp(quality.unwrap_or(70))),
            other => Err(CaptchaError::InvalidConfiguration(format!(
                "unknown output type ({other})"
            ))),
        }
    }

    #[must_use]
    pub fn png(quality: u8) -> Self {
        Self::Png {
            quality: quality.clamp(1, 9),
        }
    }

    #[must_use]
    pub fn jpeg(quality: u8) -> Self {
        Self::Jpeg {
            quality: quality.clamp(1, 100),
        }
    }

    #[must_use]
    pub fn webp(quality: u8) -> Self {
        Self::WebP {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png { quality: 1 }
    }
}

/// Immutable captcha rendering configuration.
///
/// Every `with_*` and `as_*` method returns a modified copy; the receiver is
/// never changed, so a base configuration can be shared and specialised.
#[derive(Debug, Clone)]
pub struct CaptchaConfig {
    width: u32,
    height: u32,
    background: Option<Color>,
    foreground: Option<Color>,
    credits: Option<String>,
    fluctuation_amplitude: u32,
    white_noise_density: f64,
    black_noise_density: f64,
    spaces: bool,
    output: OutputFormat,
    fonts: Vec<Arc<FontAtlas>>,
}

impl Default for CaptchaConfig {
    /// 160x80 PNG with random colours and the bundled atlases.
    fn default() -> Self {
        Self {
            width: 160,
            height: 80,
            background: None,
            foreground: None,
            credits: None,
            fluctuation_amplitude: 8,
            white_noise_density: 1.0 / 6.0,
            black_noise_density: 1.0 / 30.0,
            spaces: false,
            output: OutputFormat::default(),
            fonts: bundled::atlases().to_vec(),
        }
    }
}

impl CaptchaConfig {
    #[must_use]
    pub fn with_size(&self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_background_color(&self, red: i32, green: i32, blue: i32) -> Self {
        Self {
            background: Some(Color::clamped(red, green, blue)),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_foreground_color(&self, red: i32, green: i32, blue: i32) -> Self {
        Self {
            foreground: Some(Color::clamped(red, green, blue)),
            ..self.clone()
        }
    }

    /// Sets or clears both colours; `None` means random per generation.
    #[must_use]
    pub fn with_colors(&self, background: Option<Color>, foreground: Option<Color>) -> Self {
        Self {
            background,
            foreground,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_credits(&self, credits: Option<&str>) -> Self {
        Self {
            credits: credits.map(str::to_string),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_spaces(&self, spaces: bool) -> Self {
        Self {
            spaces,
            ..self.clone()
        }
    }

    /// Sets the vertical jitter amplitude; negative values clamp to zero.
    #[must_use]
    pub fn with_fluctuation_amplitude(&self, amplitude: i32) -> Self {
        Self {
            fluctuation_amplitude: u32::try_from(amplitude.max(0)).unwrap_or(0),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_white_noise_density(&self, density: f64) -> Self {
        Self {
            white_noise_density: density.clamp(0.0, 1.0),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_black_noise_density(&self, density: f64) -> Self {
        Self {
            black_noise_density: density.clamp(0.0, 1.0),
            ..self.clone()
        }
    }

    /// Adds an atlas to the random-selection set.
    ///
    /// An atlas with the same name replaces the existing entry. With
    /// `unset_other`, all previously configured atlases are dropped first.
    #[must_use]
    pub fn with_font(&self, atlas: Arc<FontAtlas>, unset_other: bool) -> Self {
        let mut fonts = if unset_other {
            Vec::new()
        } else {
            self.fonts.clone()
        };
        fonts.retain(|f| f.name() != atlas.name());
        fonts.push(atlas);
        Self {
            fonts,
            ..self.clone()
        }
    }

    /// Removes the atlas named `name`; absent names are ignored.
    #[must_use]
    pub fn without_font(&self, name: &str) -> Self {
        let mut fonts = self.fonts.clone();
        fonts.retain(|f| f.name() != name);
        Self {
            fonts,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn as_png(&self, quality: u8) -> Self {
        self.with_output(OutputFormat::png(quality))
    }

    #[must_use]
    pub fn as_jpeg(&self, quality: u8) -> Self {
        self.with_output(OutputFormat::jpeg(quality))
    }

    #[must_use]
    pub fn as_gif(&self) -> Self {
        self.with_output(OutputFormat::Gif)
    }

    /// Selects WebP output.
    ///
    /// WebP is always written losslessly; `quality` is clamped and kept on
    /// the format but has no effect on the encoded bytes.
    #[must_use]
    pub fn as_webp(&self, quality: u8) -> Self {
        self.with_output(OutputFormat::webp(quality))
    }

    #[must_use]
    pub fn with_output(&self, output: OutputFormat) -> Self {
        Self {
            output,
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub const fn background(&self) -> Option<Color> {
        self.background
    }

    #[must_use]
    pub const fn foreground(&self) -> Option<Color> {
        self.foreground
    }

    #[must_use]
    pub fn credits(&self) -> Option<&str> {
        self.credits.as_deref()
    }

    #[must_use]
    pub const fn fluctuation_amplitude(&self) -> u32 {
        self.fluctuation_amplitude
    }

    #[must_use]
    pub const fn white_noise_density(&self) -> f64 {
        self.white_noise_density
    }

    #[must_use]
    pub const fn black_noise_density(&self) -> f64 {
        self.black_noise_density
    }

    #[must_use]
    pub const fn spaces(&self) -> bool {
        self.spaces
    }

    #[must_use]
    pub const fn output(&self) -> OutputFormat {
        self.output
    }

    #[must_use]
    pub fn fonts(&self) -> &[Arc<FontAtlas>] {
        &self.fonts
    }

    /// Rejects values that would corrupt output if they reached the renderer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` describing the first offending value.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptchaError::InvalidConfiguration(format!(
                "size must be positive ({}x{})",
                self.width, self.height
            )));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(CaptchaError::InvalidConfiguration(format!(
                "size exceeds {MAX_DIMENSION}x{MAX_DIMENSION} ({}x{})",
                self.width, self.height
            )));
        }
        for (name, density) in [
            ("white noise density", self.white_noise_density),
            ("black noise density", self.black_noise_density),
        ] {
            if !(0.0..=1.0).contains(&density) {
                return Err(CaptchaError::InvalidConfiguration(format!(
                    "{name} must be within [0, 1] ({density})"
                )));
            }
        }
        if self.fonts.is_empty() {
            return Err(CaptchaError::InvalidConfiguration(
                "no font atlas configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads configuration from environment variables.
    ///
    /// Unset variables keep their defaults. `CAPTCHA_FONTS` replaces the
    /// bundled atlases with a comma-separated list of atlas image paths.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` naming the offending variable, or the
    /// decoding error of an atlas listed in `CAPTCHA_FONTS`.
    pub fn from_env() -> Result<Self> {
        let size = get_env_or("CAPTCHA_SIZE", "160x80");
        let (width, height) = parse_size(&size)?;
        let amplitude = get_env_parsed_or::<i32>("CAPTCHA_FLUCTUATION_AMPLITUDE", 8)?;
        let white_noise = get_env_parsed_or::<f64>("CAPTCHA_WHITE_NOISE", 0.16)?;
        let black_noise = get_env_parsed_or::<f64>("CAPTCHA_BLACK_NOISE", 0.03)?;
        let background = Color::parse_hex(&get_env_or("CAPTCHA_BACKGROUND", "random"))?;
        let foreground = Color::parse_hex(&get_env_or("CAPTCHA_FOREGROUND", "random"))?;
        let quality = env::var("CAPTCHA_QUALITY")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u8>().map_err(|_| {
                    CaptchaError::InvalidConfiguration(format!("CAPTCHA_QUALITY ({s})"))
                })
            })
            .transpose()?;
        let output = OutputFormat::from_name(&get_env_or("CAPTCHA_TYPE", "png"), quality)?;
        let credits = env::var("CAPTCHA_CREDITS").ok().filter(|s| !s.is_empty());

        let mut config = Self::default()
            .with_size(width, height)
            .with_colors(background, foreground)
            .with_credits(credits.as_deref())
            .with_fluctuation_amplitude(amplitude)
            .with_white_noise_density(white_noise)
            .with_black_noise_density(black_noise)
            .with_spaces(get_env_bool("CAPTCHA_SPACES"))
            .with_output(output);

        let fonts = get_env_or("CAPTCHA_FONTS", "");
        let paths: Vec<&str> = fonts
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        for (i, path) in paths.iter().enumerate() {
            config = config.with_font(Arc::new(FontAtlas::open(path)?), i == 0);
        }

        Ok(config)
    }
}

fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_bool(key: &str) -> bool {
    env::var(key)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(false)
}

fn get_env_parsed_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(v) if !v.is_empty() => v
            .parse()
            .map_err(|_| CaptchaError::InvalidConfiguration(format!("{key} ({v})"))),
        _ => Ok(default),
    }
}

fn parse_size(size: &str) -> Result<(u32, u32)> {
    let invalid = || CaptchaError::InvalidConfiguration(format!("invalid size ({size})"));
    let (w, h) = size
        .to_lowercase()
        .split_once('x')
        .map(|(w, h)| (w.to_string(), h.to_string()))
        .ok_or_else(invalid)?;
    let width: u32 = w.parse().map_err(|_| invalid())?;
    let height: u32 = h.parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}
