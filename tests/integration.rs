mod common;

use common::{block_atlas, plain_config, seeded};
use std::sync::Arc;
use std::thread;
use wavecaptcha::{Alphabet, CaptchaConfig, CaptchaError, CaptchaGenerator};

#[test]
fn test_end_to_end_png() {
    let generator = CaptchaGenerator::new(plain_config().with_size(160, 80).as_png(9));
    let bytes = generator.generate("a1b2").unwrap();
    assert!(!bytes.is_empty());
    assert_eq!(&bytes[..4], b"\x89PNG");

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (160, 80));
}

#[test]
fn test_output_formats_magic_bytes() {
    let base = plain_config();
    let cases: [(CaptchaConfig, &[u8]); 3] = [
        (base.as_png(6), b"\x89PNG"),
        (base.as_jpeg(70), b"\xFF\xD8"),
        (base.as_gif(), b"GIF8"),
    ];
    for (config, magic) in cases {
        let bytes = CaptchaGenerator::new(config).generate("q9z").unwrap();
        assert_eq!(&bytes[..magic.len()], magic);
    }

    let webp = CaptchaGenerator::new(base.as_webp(70))
        .generate("q9z")
        .unwrap();
    assert_eq!(&webp[..4], b"RIFF");
    assert_eq!(&webp[8..12], b"WEBP");
}

#[test]
fn test_every_symbol_renders_with_default_config() {
    let generator = CaptchaGenerator::default();
    let alphabet = Alphabet.as_str();
    for chunk in alphabet.as_bytes().chunks(6) {
        let text = std::str::from_utf8(chunk).unwrap();
        let bytes = generator.generate(text).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }
}

#[test]
fn test_unsupported_characters() {
    let generator = CaptchaGenerator::new(plain_config());
    for text in ["abc!", "héllo", "", "ab_c"] {
        match generator.generate(text) {
            Err(CaptchaError::UnsupportedCharacters { allowed }) => {
                assert_eq!(allowed, Alphabet.as_str());
            }
            other => panic!("unexpected result for {text:?}: {other:?}"),
        }
    }
}

#[test]
fn test_deterministic_with_seed_and_no_noise() {
    let generator = CaptchaGenerator::new(plain_config().with_credits(Some("demo")));
    let a = generator.render("x7y8", &mut seeded(2024)).unwrap();
    let b = generator.render("x7y8", &mut seeded(2024)).unwrap();
    assert_eq!(a, b);

    let c = generator.render("x7y8", &mut seeded(2025)).unwrap();
    assert_ne!(a, c);
}

#[test]
fn test_long_text_is_stretched_across_canvas() {
    let config = plain_config()
        .with_font(block_atlas(20, 40), true)
        .with_fluctuation_amplitude(0);
    let generator = CaptchaGenerator::new(config);
    let canvas = generator
        .render("0123456789abcdef", &mut seeded(5))
        .unwrap();

    let inked_columns = (0..160)
        .filter(|&x| (0..80).any(|y| canvas.get_pixel(x, y)[0] < 128))
        .count();
    assert!(inked_columns > 130, "only {inked_columns} columns inked");
}

#[test]
fn test_short_text_leaves_margins() {
    let config = plain_config()
        .with_font(block_atlas(10, 30), true)
        .with_fluctuation_amplitude(0);
    let generator = CaptchaGenerator::new(config);
    let canvas = generator.render("ab", &mut seeded(6)).unwrap();

    let inked: Vec<u32> = (0..160)
        .filter(|&x| (0..80).any(|y| canvas.get_pixel(x, y)[0] < 255))
        .collect();
    let left = inked[0];
    let right = 159 - inked[inked.len() - 1];
    assert!(left > 45 && right > 45, "left {left} right {right}");
    assert!(left.abs_diff(right) <= 20, "left {left} right {right}");
}

#[test]
fn test_missing_glyph_in_custom_atlas() {
    let full = block_atlas(8, 20);
    let pixels = full.pixels();
    let digits =
        image::imageops::crop_imm(pixels, 0, 0, 5 + 10 * 18, pixels.height()).to_image();
    let atlas = wavecaptcha::FontAtlas::decode("digits", digits).unwrap();
    assert_eq!(atlas.metrics().len(), 10);

    let generator = CaptchaGenerator::new(plain_config().with_font(Arc::new(atlas), true));
    assert!(generator.generate("2024").is_ok());
    assert!(matches!(
        generator.generate("20a4"),
        Err(CaptchaError::MalformedAtlas(_))
    ));
}

#[test]
fn test_concurrent_generation_shares_generator() {
    let generator = Arc::new(CaptchaGenerator::new(plain_config()));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let generator = generator.clone();
            thread::spawn(move || {
                let text = format!("abc{i}");
                let a = generator.render(&text, &mut seeded(i)).unwrap();
                let b = generator.render(&text, &mut seeded(i)).unwrap();
                assert_eq!(a, b);
                generator.generate(&text).unwrap()
            })
        })
        .collect();
    for handle in handles {
        let bytes = handle.join().unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }
}

#[test]
fn test_data_uri_output() {
    let uri = CaptchaGenerator::new(plain_config().as_webp(60))
        .generate_data_uri("hello")
        .unwrap();
    assert!(uri.starts_with("data:image/webp;base64,"));
}
