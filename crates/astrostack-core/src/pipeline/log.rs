use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, error, info, warn};

use super::types::PipelineStage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// One entry of a job log.
#[derive(Clone, Debug)]
pub struct LogLine {
    pub timestamp: SystemTime,
    /// Time since the job started.
    pub elapsed: Duration,
    pub level: LogLevel,
    pub stage: Option<PipelineStage>,
    /// Job position of the frame the line is about, if any.
    pub frame: Option<usize>,
    pub message: String,
}

impl std::fmt::Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:>8.3}s] {:<5}", self.elapsed.as_secs_f64(), self.level)?;
        if let Some(stage) = self.stage {
            write!(f, " {stage}")?;
        }
        if let Some(frame) = self.frame {
            write!(f, " frame #{frame}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Append-only log owned by one job.
///
/// Lines are kept for the caller and also emitted through `tracing`.
pub struct JobLog {
    started: Instant,
    lines: Mutex<Vec<LogLine>>,
}

impl Default for JobLog {
    fn default() -> Self {
        Self::new()
    }
}

impl JobLog {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn record(
        &self,
        level: LogLevel,
        stage: Option<PipelineStage>,
        frame: Option<usize>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        let stage_name = stage.map(|s| s.to_string()).unwrap_or_default();
        match level {
            LogLevel::Debug => debug!(stage = %stage_name, frame, "{message}"),
            LogLevel::Info => info!(stage = %stage_name, frame, "{message}"),
            LogLevel::Warn => warn!(stage = %stage_name, frame, "{message}"),
            LogLevel::Error => error!(stage = %stage_name, frame, "{message}"),
        }

        let line = LogLine {
            timestamp: SystemTime::now(),
            elapsed: self.started.elapsed(),
            level,
            stage,
            frame,
            message,
        };
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }

    pub fn info(&self, stage: PipelineStage, message: impl Into<String>) {
        self.record(LogLevel::Info, Some(stage), None, message);
    }

    pub fn warn_frame(&self, stage: PipelineStage, frame: usize, message: impl Into<String>) {
        self.record(LogLevel::Warn, Some(stage), Some(frame), message);
    }

    pub fn debug_frame(&self, stage: PipelineStage, frame: usize, message: impl Into<String>) {
        self.record(LogLevel::Debug, Some(stage), Some(frame), message);
    }

    pub fn error(&self, stage: Option<PipelineStage>, message: impl Into<String>) {
        self.record(LogLevel::Error, stage, None, message);
    }

    pub fn into_lines(self) -> Vec<LogLine> {
        self.lines.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
