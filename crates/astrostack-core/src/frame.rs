use ndarray::{s, Array3, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::consts::CHANNELS;
use crate::error::{Result, StackError};

/// A single RGBA image frame.
/// Pixel values are f32 in [0.0, 1.0].
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width, 4)
    pub data: Array3<f32>,
    /// Point sources found in (or supplied for) this frame
    pub stars: Vec<Star>,
    /// Original bit depth before conversion (8 or 16)
    pub original_bit_depth: u8,
    /// Optional per-frame metadata
    pub metadata: FrameMetadata,
}

impl Frame {
    /// Wrap an RGBA buffer. `data` must have shape `(height, width, 4)`.
    pub fn new(data: Array3<f32>, bit_depth: u8) -> Self {
        debug_assert_eq!(data.dim().2, CHANNELS, "frames carry exactly 4 channels");
        Self {
            data,
            stars: Vec::new(),
            original_bit_depth: bit_depth,
            metadata: FrameMetadata::default(),
        }
    }

    /// Build a frame from interleaved RGBA samples.
    pub fn from_rgba(width: usize, height: usize, pixels: Vec<f32>, bit_depth: u8) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(StackError::InvalidFrame(format!(
                "zero-sized frame {}x{}",
                width, height
            )));
        }
        let expected = width * height * CHANNELS;
        if pixels.len() != expected {
            return Err(StackError::InvalidFrame(format!(
                "{}x{} RGBA frame needs {} samples, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        let data = Array3::from_shape_vec((height, width, CHANNELS), pixels)
            .map_err(|e| StackError::InvalidFrame(e.to_string()))?;
        Ok(Self::new(data, bit_depth))
    }

    /// A frame where every pixel has the same RGBA value.
    pub fn filled(width: usize, height: usize, rgba: [f32; CHANNELS]) -> Self {
        let data = Array3::from_shape_fn((height, width, CHANNELS), |(_, _, ch)| rgba[ch]);
        Self::new(data, 8)
    }

    pub fn with_stars(mut self, stars: Vec<Star>) -> Self {
        self.stars = stars;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.metadata.label = Some(label.into());
        self
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    /// `(width, height)`, the order used in log and error messages.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    pub fn pixel(&self, x: usize, y: usize) -> [f32; CHANNELS] {
        let mut out = [0.0; CHANNELS];
        for (ch, v) in out.iter_mut().enumerate() {
            *v = self.data[[y, x, ch]];
        }
        out
    }

    /// View of a single channel as a `(height, width)` plane.
    pub fn channel(&self, ch: usize) -> ArrayView2<'_, f32> {
        self.data.slice(s![.., .., ch])
    }

    /// Human-readable identifier for logs: the label if any, else the index.
    pub fn display_name(&self) -> String {
        match &self.metadata.label {
            Some(label) => format!("#{} ({})", self.metadata.frame_index, label),
            None => format!("#{}", self.metadata.frame_index),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameMetadata {
    /// Position of the frame in its job (0 = reference).
    pub frame_index: usize,
    /// Source name, usually the file the frame was decoded from.
    pub label: Option<String>,
}

/// Whether a star came from the detector or from the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StarSource {
    #[default]
    Detected,
    Manual,
}

/// A point source in frame coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Star {
    /// Subpixel centroid column.
    pub x: f64,
    /// Subpixel centroid row.
    pub y: f64,
    /// Summed brightness of the star's pixels.
    pub brightness: f64,
    /// Number of pixels in the star.
    pub size: usize,
    /// Full width at half maximum estimate, in pixels.
    pub fwhm: Option<f64>,
    /// Major/minor axis ratio from second moments (1.0 = round).
    pub elongation: f64,
    #[serde(default)]
    pub source: StarSource,
}

impl Star {
    /// A user-supplied star at `(x, y)`.
    ///
    /// Manual stars have no photometry, so they all rank equally bright.
    pub fn manual(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            brightness: 1.0,
            size: 1,
            fwhm: None,
            elongation: 1.0,
            source: StarSource::Manual,
        }
    }
}
