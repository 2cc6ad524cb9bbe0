//! Configuration management.
//!
//! Immutable captcha settings built with copy-on-write `with_*` methods, and
//! environment loading for the command-line binary.

mod error;
mod settings;

pub use error::{CaptchaError, Result};
pub use settings::{CaptchaConfig, Color, MAX_DIMENSION, OutputFormat};
