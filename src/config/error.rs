//! Error types and result aliases.
//!
//! Defines the core `CaptchaError` enumeration and common `Result` type.

use thiserror::Error;

/// Captcha rendering errors.
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// Text contains a symbol outside the alphabet.
    #[error("text contains unsupported characters (allowed: {allowed})")]
    UnsupportedCharacters { allowed: String },

    /// Atlas image cannot supply the requested glyphs.
    #[error("malformed font atlas: {0}")]
    MalformedAtlas(String),

    /// Configuration value outside its permitted range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// TrueType font could not be parsed or rasterized.
    #[error("font error: {0}")]
    Font(String),

    /// File read or write failure in the command-line binary.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding failure.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl CaptchaError {
    /// Returns the permitted character set for `UnsupportedCharacters`.
    #[must_use]
    pub fn allowed_characters(&self) -> Option<&str> {
        match self {
            Self::UnsupportedCharacters { allowed } => Some(allowed),
            _ => None,
        }
    }
}

/// Result type alias for `CaptchaError`.
pub type Result<T> = std::result::Result<T, CaptchaError>;
