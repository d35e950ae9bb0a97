/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum frame count to use frame-level Rayon parallelism.
pub const PARALLEL_FRAME_THRESHOLD: usize = 4;

/// Number of channels in every frame buffer (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Index of the alpha channel in a frame buffer.
pub const ALPHA: usize = 3;

/// Number of color channels (alpha excluded).
pub const COLOR_CHANNELS: usize = 3;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f32 = 1e-10;

/// Alpha at or below this value marks a pixel as not contributing to a stack.
pub const ALPHA_EPSILON: f32 = 1e-3;

/// Resampling source coordinates closer than this to an integer are snapped.
pub const SUBPIXEL_SNAP: f64 = 1e-6;

/// ITU-R BT.601 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.114;

/// Minimum number of frames (reference included) for a stack.
pub const MIN_STACK_FRAMES: usize = 2;

/// Minimum number of star correspondences for a star-based alignment.
pub const MIN_CORRESPONDENCES: usize = 3;

/// Default brightness threshold (fraction of full scale) for star detection.
pub const DEFAULT_STAR_THRESHOLD: f32 = 0.5;

/// Radius (px) around a blob centroid used to measure its surroundings.
pub const DEFAULT_SURROUND_RADIUS: f64 = 10.0;

/// Surrounding mean brightness above which a blob is treated as extended
/// structure (nebula core, planetary disc) rather than a star.
pub const DEFAULT_SATURATION_THRESHOLD: f32 = 0.5;

/// Number of brightest stars used to build matching triangles.
pub const DEFAULT_TRIANGLE_STARS: usize = 15;

/// Maximum distance between two triangles in invariant (ratio) space.
pub const DEFAULT_TRIANGLE_TOLERANCE: f64 = 0.01;

/// Shortest triangle side (px) accepted for matching.
pub const MIN_TRIANGLE_SIDE: f64 = 1.0;

/// Relative gap between sorted triangle sides below which the vertex order
/// is considered ambiguous.
pub const MIN_SIDE_SEPARATION: f64 = 0.02;

/// Residual (px) above which a correspondence is rejected after a fit.
pub const DEFAULT_MATCH_TOLERANCE: f64 = 2.0;

/// Maximum number of candidate transforms scored by consensus alignment.
pub const DEFAULT_CONSENSUS_ITERATIONS: usize = 500;

/// Seed for consensus sampling, so repeated runs give identical stacks.
pub const DEFAULT_CONSENSUS_SEED: u64 = 0x5eed_5a4d;

/// Default planetary limb-detection quality (0-100).
pub const DEFAULT_PLANETARY_QUALITY: u8 = 50;

/// Number of angular bins used for the planetary rotation estimate.
pub const ROTATION_PROFILE_BINS: usize = 360;

/// Default minimum phase-correlation peak-to-mean ratio for a translation
/// to be trusted by the dumb strategy. Pure noise stays well below this.
pub const DEFAULT_MIN_CORRELATION_CONFIDENCE: f64 = 10.0;

/// Number of histogram bins for Otsu's thresholding.
pub const OTSU_HISTOGRAM_BINS: usize = 256;

/// Width of the border strip (px) used to estimate the sky background.
pub const BORDER_STRIP_WIDTH: usize = 10;

/// Default Gaussian sigma applied before disc thresholding.
pub const DEFAULT_DISC_BLUR_SIGMA: f32 = 2.0;

/// Minimum component area (px) to be considered a planetary disc.
pub const DEFAULT_DISC_MIN_AREA: usize = 50;

/// Extra radius (px) added around each removed star's mask disc.
pub const DEFAULT_MASK_MARGIN: usize = 2;

/// Radius (px) scanned for unmasked neighbours when ordering inpainting.
pub const DEFAULT_INPAINT_SEARCH_RADIUS: usize = 3;

/// Radius (px) of the inverse-distance-squared inpainting kernel.
pub const DEFAULT_INPAINT_FILL_RADIUS: usize = 5;

/// Size of the tone-mapping lookup table.
pub const LUT_SIZE: usize = 256;
