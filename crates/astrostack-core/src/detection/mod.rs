pub mod blobs;
pub mod config;
pub mod disc;
pub mod morphology;
pub mod stars;
pub mod threshold;

pub use blobs::{brightness_map, extract_blobs, surrounding_mean, Blob};
pub use config::{DiscDetectionConfig, StarDetectionConfig, ThresholdMethod};
pub use disc::{detect_disc, Disc};
pub use stars::{detect, detect_stars};
