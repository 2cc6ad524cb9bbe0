//! Image synthesis stages.
//!
//! Layout, resampling, wave distortion, and the credit footer.

pub mod distortion;
pub mod footer;
pub mod layout;
pub mod resample;

pub use distortion::{DisplacementField, composite};
pub use footer::draw_credits;
pub use layout::{GlyphLayoutEngine, Layout, LayoutStep, Mask, add_noise};
pub use resample::{FitMode, ResampleStage};
