pub mod star_mask;
pub mod star_removal;

pub use star_mask::StarMask;
pub use star_removal::{remove_stars, RemovalReport, StarRemovalConfig};
