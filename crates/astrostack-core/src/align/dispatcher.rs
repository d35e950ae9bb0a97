use std::borrow::Cow;

use ndarray::Array2;

use crate::detection::brightness_map;
use crate::error::AlignFailure;
use crate::frame::Frame;

use super::config::AlignmentMethod;
use super::consensus::align_consensus;
use super::dumb::align_dumb;
use super::planetary::align_planetary;
use super::standard::align_standard;
use super::AlignmentResult;

/// Estimate the transform mapping `target` onto `reference`.
pub fn align(reference: &Frame, target: &Frame, method: &AlignmentMethod) -> AlignmentResult {
    Aligner::new(reference, method).align(target)
}

/// A reference frame prepared once for aligning many targets against it.
///
/// Pixel-based strategies need the reference brightness map; it is computed
/// here instead of once per target.
pub struct Aligner<'a> {
    reference: &'a Frame,
    reference_map: Option<Array2<f32>>,
    method: &'a AlignmentMethod,
}

impl<'a> Aligner<'a> {
    pub fn new(reference: &'a Frame, method: &'a AlignmentMethod) -> Self {
        let reference_map = (!method.uses_stars()).then(|| brightness_map(reference));
        Self {
            reference,
            reference_map,
            method,
        }
    }

    pub fn method(&self) -> &AlignmentMethod {
        self.method
    }

    pub fn align(&self, target: &Frame) -> AlignmentResult {
        if is_empty(self.reference) || is_empty(target) {
            return AlignmentResult::failed(AlignFailure::EmptyFrame);
        }

        match self.method {
            AlignmentMethod::Standard(config) => {
                align_standard(&self.reference.stars, &target.stars, config)
            }
            AlignmentMethod::Consensus(config) => {
                align_consensus(&self.reference.stars, &target.stars, config)
            }
            AlignmentMethod::Planetary(config) => {
                align_planetary(&self.map(), &brightness_map(target), config)
            }
            AlignmentMethod::Dumb(config) => {
                align_dumb(&self.map(), &brightness_map(target), config)
            }
        }
    }

    fn map(&self) -> Cow<'_, Array2<f32>> {
        match &self.reference_map {
            Some(map) => Cow::Borrowed(map),
            None => Cow::Owned(brightness_map(self.reference)),
        }
    }
}

fn is_empty(frame: &Frame) -> bool {
    frame.width() == 0 || frame.height() == 0
}
