//! Library definitions.
//!
//! Exports the alphabet, font atlas codec, rendering stages, and the
//! `CaptchaGenerator` that ties them together.

pub mod alphabet;
pub mod config;
pub mod font;
pub mod output;
pub mod pipeline;
pub mod render;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;
pub use alphabet::Alphabet;
pub use config::{CaptchaConfig, CaptchaError, Color, OutputFormat, Result};
pub use font::{AtlasStyle, FontAtlas, GlyphMetric};
pub use pipeline::CaptchaGenerator;
