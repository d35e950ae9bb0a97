pub mod config;
mod job;
mod log;
mod orchestrator;
mod types;

pub use config::StackConfig;
pub use job::{JobContext, StackJob};
pub use log::{JobLog, LogLevel, LogLine};
pub use orchestrator::{run_stack, stack_frames};
pub use types::{
    FrameAlignment, NoOpReporter, PipelineStage, ProgressReporter, StackFailure, StackOutput,
};
