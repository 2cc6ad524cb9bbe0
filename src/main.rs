//! `wavecaptcha` - wave-distorted text captcha renderer.
//!
//! Copyright (C) 2026 wavecaptcha contributors
//! SPDX-License-Identifier: MIT
//!
//! Sets up logging, loads configuration from the environment, and runs one of
//! two commands:
//!
//! - `create <text> <file>` renders a captcha into `file`.
//! - `font-convert <ttf> <png> [--outline]` builds a font atlas from a
//!   TrueType font.

use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wavecaptcha::font::{AtlasStyle, encode_png};
use wavecaptcha::{CaptchaConfig, CaptchaError, CaptchaGenerator};

const USAGE: &str = "usage:
  wavecaptcha create <text> <file>
  wavecaptcha font-convert <ttf> <png> [--outline]";

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let (non_blocking, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking);

    if log_format.eq_ignore_ascii_case("pretty") {
        subscriber.init();
    } else {
        subscriber.json().init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["create", text, file] => create(text, Path::new(file)),
        ["font-convert", ttf, png] => font_convert(Path::new(ttf), Path::new(png), false),
        ["font-convert", ttf, png, "--outline"] => {
            font_convert(Path::new(ttf), Path::new(png), true)
        }
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn create(text: &str, file: &Path) -> Result<(), CaptchaError> {
    let config = CaptchaConfig::from_env()?;
    info!(
        width = config.width(),
        height = config.height(),
        output = ?config.output(),
        fonts = config.fonts().len(),
        "Generator initialized"
    );
    let bytes = CaptchaGenerator::new(config).generate(text)?;
    std::fs::write(file, &bytes)?;
    info!(file = %file.display(), bytes = bytes.len(), "Captcha written");
    Ok(())
}

fn font_convert(ttf: &Path, png: &Path, outline: bool) -> Result<(), CaptchaError> {
    let data = std::fs::read(ttf)?;
    let style = if outline {
        AtlasStyle::Outline
    } else {
        AtlasStyle::Plain
    };
    let bytes = encode_png(&data, style)?;
    std::fs::write(png, &bytes)?;
    info!(ttf = %ttf.display(), png = %png.display(), ?style, "Atlas written");
    Ok(())
}
