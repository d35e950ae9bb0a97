use thiserror::Error;

use crate::align::AlignmentResult;
use crate::error::StackError;
use crate::frame::Frame;
use crate::postprocess::RemovalReport;

use super::log::LogLine;

/// Pipeline processing stage, used for progress reporting and log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Detection,
    Alignment,
    Stacking,
    StarRemoval,
    ToneMapping,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Detection => write!(f, "Detecting stars"),
            Self::Alignment => write!(f, "Aligning frames"),
            Self::Stacking => write!(f, "Stacking"),
            Self::StarRemoval => write!(f, "Removing stars"),
            Self::ToneMapping => write!(f, "Tone mapping"),
        }
    }
}

/// Thread-safe progress reporting for a stacking job.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}

    /// Overall job progress in `[0, 1]`. Never decreases within a job and
    /// ends at exactly 1.0 on success.
    fn progress(&self, _fraction: f32) {}
}

/// Reporter that ignores everything.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Per-frame outcome recorded in a finished job.
#[derive(Clone, Debug)]
pub struct FrameAlignment {
    /// Position of the frame in the job.
    pub frame: usize,
    pub label: Option<String>,
    /// Stars available to the aligner for this frame.
    pub stars: usize,
    pub result: AlignmentResult,
}

/// A successful stack.
#[derive(Clone, Debug)]
pub struct StackOutput {
    /// Combined (and optionally post-processed) frame on the reference grid.
    pub frame: Frame,
    /// One entry per non-reference frame, in job order.
    pub alignments: Vec<FrameAlignment>,
    /// Frames that went into the combine, reference included.
    pub frames_combined: usize,
    pub removal: Option<RemovalReport>,
    pub log: Vec<LogLine>,
}

/// A failed job: the fatal error and everything logged up to it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct StackFailure {
    #[source]
    pub error: StackError,
    pub log: Vec<LogLine>,
}
