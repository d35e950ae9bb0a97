use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use astrostack_core::pipeline::{PipelineStage, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};

/// Drives a terminal progress bar from pipeline callbacks.
///
/// The bar position is the overall job fraction in percent; the message
/// shows the current stage and its item count.
pub struct BarReporter {
    bar: ProgressBar,
    stage_total: AtomicUsize,
}

impl BarReporter {
    pub fn new() -> Result<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:28} [{bar:40}] {pos}%")?
                .progress_chars("=> "),
        );
        Ok(Self {
            bar,
            stage_total: AtomicUsize::new(0),
        })
    }

    pub fn finish(&self, message: &'static str) {
        self.bar.finish_with_message(message);
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.stage_total
            .store(total_items.unwrap_or(0), Ordering::Relaxed);
        self.bar.set_message(stage.to_string());
    }

    fn advance(&self, items_done: usize) {
        let total = self.stage_total.load(Ordering::Relaxed);
        if total > 0 {
            self.bar
                .set_message(format!("Aligning frames {items_done}/{total}"));
        }
    }

    fn progress(&self, fraction: f32) {
        self.bar
            .set_position((fraction.clamp(0.0, 1.0) * 100.0).round() as u64);
    }
}
