use thiserror::Error;

use crate::pipeline::PipelineStage;

#[derive(Error, Debug)]
pub enum StackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Insufficient frames: {usable} usable, at least {required} required")]
    InsufficientFrames { usable: usize, required: usize },

    #[error(
        "Frame {frame} has dimensions {}x{}, expected {}x{}",
        actual.0, actual.1, expected.0, expected.1
    )]
    DimensionMismatch {
        frame: usize,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Job cancelled during {stage}")]
    Cancelled { stage: PipelineStage },
}

pub type Result<T> = std::result::Result<T, StackError>;

/// Why a single frame could not be aligned.
///
/// These never abort a job: the pipeline logs them and drops the frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignFailure {
    #[error("too few stars ({found}, need {required})")]
    TooFewStars { found: usize, required: usize },

    #[error("too few star correspondences ({found}, need {required})")]
    TooFewMatches { found: usize, required: usize },

    #[error("no consensus transform ({best} agreeing stars, need {required})")]
    NoConsensus { best: usize, required: usize },

    #[error("no planetary disc found in the {0} frame")]
    DiscNotFound(&'static str),

    #[error("degenerate transform fit")]
    DegenerateFit,

    #[error("resampling failed: {0}")]
    ResampleFailed(String),

    #[error("frame is empty")]
    EmptyFrame,
}
