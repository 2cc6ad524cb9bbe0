//! Bundled atlases.
//!
//! Three atlases are produced from embedded DejaVu fonts on first use and
//! shared read-only for the lifetime of the process.

use super::atlas::FontAtlas;
use super::encoder::{AtlasStyle, encode};
use ab_glyph::FontRef;
use std::sync::{Arc, OnceLock};
use tracing::debug;

pub const SERIF_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSerif-Bold.ttf");
pub const SANS_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");
pub const MONO_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSansMono-Bold.ttf");

const BUNDLED: [(&str, &[u8], AtlasStyle); 3] = [
    ("dejavu-serif-bold", SERIF_BOLD, AtlasStyle::Plain),
    ("dejavu-sans-bold", SANS_BOLD, AtlasStyle::Plain),
    ("dejavu-sans-mono-bold-outline", MONO_BOLD, AtlasStyle::Outline),
];

static ATLASES: OnceLock<Vec<Arc<FontAtlas>>> = OnceLock::new();
static FOOTER_FONT: OnceLock<FontRef<'static>> = OnceLock::new();

/// Returns the bundled atlas set, building it on first call.
///
/// # Panics
///
/// Panics if an embedded font fails to parse or encode.
pub fn atlases() -> &'static [Arc<FontAtlas>] {
    ATLASES.get_or_init(|| {
        BUNDLED
            .iter()
            .map(|&(name, ttf, style)| {
                let font = FontRef::try_from_slice(ttf).expect("Failed to load embedded font");
                let pixels = encode(&font, style).expect("Failed to encode embedded font");
                let atlas =
                    FontAtlas::decode(name, pixels).expect("Failed to decode embedded atlas");
                debug!(name, glyph_height = atlas.glyph_height(), "Bundled atlas ready");
                Arc::new(atlas)
            })
            .collect()
    })
}

/// Font used for the credit footer.
///
/// # Panics
///
/// Panics if the embedded font data is invalid.
pub fn footer_font() -> &'static FontRef<'static> {
    FOOTER_FONT
        .get_or_init(|| FontRef::try_from_slice(SANS_BOLD).expect("Failed to load embedded font"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;

    #[test]
    fn test_bundled_atlases_cover_alphabet() {
        let atlases = atlases();
        assert_eq!(atlases.len(), 3);
        for atlas in atlases {
            assert_eq!(atlas.metrics().len(), Alphabet::LEN);
            assert!(atlas.require(Alphabet.as_str()).is_ok());
            assert!(atlas.glyph_height() > 35);
        }
    }

    #[test]
    fn test_bundled_atlases_are_shared() {
        let first = atlases();
        let second = atlases();
        assert!(Arc::ptr_eq(&first[0], &second[0]));
    }
}
