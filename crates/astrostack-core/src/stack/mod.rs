pub mod combine;
pub mod median;
pub mod sigma_clip;

pub use combine::{combine, CombineMode};
pub use sigma_clip::SigmaClipParams;
