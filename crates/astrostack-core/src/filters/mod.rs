pub mod gaussian_blur;
pub mod histogram;
pub mod tone;

pub use histogram::auto_levels;
pub use tone::{apply, apply_settings, build_lut, BasicAdjustments, LevelsParams, ToneSettings};
