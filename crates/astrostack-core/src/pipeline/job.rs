use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::frame::{Frame, Star};

use super::config::StackConfig;
use super::types::{NoOpReporter, ProgressReporter};

/// Everything a stacking run needs. Frame 0 is the reference.
#[derive(Clone, Debug)]
pub struct StackJob {
    pub frames: Vec<Frame>,
    pub config: StackConfig,
    /// Planetary limb quality (0-100), overriding the configured one.
    pub quality: Option<u8>,
    /// User-picked stars for the reference frame; replaces detection there.
    pub reference_stars: Option<Vec<Star>>,
}

impl StackJob {
    pub fn new(frames: Vec<Frame>, config: StackConfig) -> Self {
        Self {
            frames,
            config,
            quality: None,
            reference_stars: None,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_reference_stars(mut self, stars: Vec<Star>) -> Self {
        self.reference_stars = Some(stars);
        self
    }
}

/// Side channels of a running job: progress sink and cancellation flag.
#[derive(Clone)]
pub struct JobContext {
    pub reporter: Arc<dyn ProgressReporter>,
    cancel: Arc<AtomicBool>,
}

impl Default for JobContext {
    fn default() -> Self {
        Self::new(Arc::new(NoOpReporter))
    }
}

impl JobContext {
    pub fn new(reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            reporter,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

/// Overall job progress as "completed units / total units".
///
/// Updates are serialised so observers never see the fraction go down, even
/// when frames finish on several threads.
pub(crate) struct MonotonicProgress {
    reporter: Arc<dyn ProgressReporter>,
    state: Mutex<ProgressState>,
}

struct ProgressState {
    done: usize,
    total: usize,
    last: f32,
    /// Items finished in the current stage.
    items: usize,
}

impl MonotonicProgress {
    pub(crate) fn new(reporter: Arc<dyn ProgressReporter>, total: usize) -> Self {
        Self {
            reporter,
            state: Mutex::new(ProgressState {
                done: 0,
                total: total.max(1),
                last: 0.0,
                items: 0,
            }),
        }
    }

    /// Mark one unit complete.
    pub(crate) fn step(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.bump(&mut state);
    }

    /// Mark one stage item (a frame) complete; the item count reported to
    /// `advance` and the overall fraction move together under one lock.
    pub(crate) fn item_done(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.items += 1;
        self.reporter.advance(state.items);
        self.bump(&mut state);
    }

    fn bump(&self, state: &mut ProgressState) {
        state.done = (state.done + 1).min(state.total);
        let fraction = state.done as f32 / state.total as f32;
        if fraction > state.last {
            state.last = fraction;
            self.reporter.progress(fraction);
        }
    }

    /// Jump to exactly 1.0.
    pub(crate) fn finish(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.done = state.total;
        state.last = 1.0;
        self.reporter.progress(1.0);
    }
}
