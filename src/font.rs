//! Font atlases.
//!
//! Implements the alpha-track atlas format, its producer, and the bundled
//! atlas set.

pub mod atlas;
pub mod bundled;
pub mod encoder;

pub use atlas::{AtlasHeader, FontAtlas, GlyphMetric, decode};
pub use encoder::{AtlasStyle, encode, encode_png};
