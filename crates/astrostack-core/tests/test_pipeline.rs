mod common;

use std::sync::{Arc, Mutex};

use astrostack_core::align::{AlignmentMethod, AlignmentResult, DumbConfig, PlanetaryConfig};
use astrostack_core::error::{AlignFailure, StackError};
use astrostack_core::frame::Frame;
use astrostack_core::pipeline::{
    run_stack, stack_frames, JobContext, LogLevel, PipelineStage, ProgressReporter, StackConfig,
    StackJob,
};
use astrostack_core::filters::ToneSettings;
use astrostack_core::postprocess::StarRemovalConfig;

use common::{assert_frames_close, frame_with_discs, gradient_frame, manual_stars};

/// Frame `a` moved one pixel to the right; column 0 is filled with black.
fn shifted_right(a: &Frame) -> Frame {
    let mut b = a.clone();
    let (h, w) = (a.height(), a.width());
    for row in 0..h {
        for col in 0..w {
            for ch in 0..3 {
                b.data[[row, col, ch]] = if col == 0 {
                    0.0
                } else {
                    a.data[[row, col - 1, ch]]
                };
            }
        }
    }
    b
}

const A_STARS: [(f64, f64); 3] = [(0.0, 0.0), (2.0, 1.0), (0.0, 3.0)];
const B_STARS: [(f64, f64); 3] = [(1.0, 0.0), (3.0, 1.0), (1.0, 3.0)];

fn shifted_pair() -> (Frame, Frame) {
    let a = gradient_frame(4, 4);
    let b = shifted_right(&a).with_stars(manual_stars(&B_STARS));
    (a, b)
}

#[derive(Default)]
struct Recorder {
    fractions: Mutex<Vec<f32>>,
    stages: Mutex<Vec<PipelineStage>>,
    items: Mutex<Vec<usize>>,
}

impl ProgressReporter for Recorder {
    fn begin_stage(&self, stage: PipelineStage, _total_items: Option<usize>) {
        self.stages.lock().unwrap().push(stage);
    }

    fn advance(&self, items_done: usize) {
        self.items.lock().unwrap().push(items_done);
    }

    fn progress(&self, fraction: f32) {
        self.fractions.lock().unwrap().push(fraction);
    }
}

/// Cancels its job as soon as `stage` begins.
struct CancelOn {
    stage: PipelineStage,
    ctx: Mutex<Option<JobContext>>,
}

impl ProgressReporter for CancelOn {
    fn begin_stage(&self, stage: PipelineStage, _total_items: Option<usize>) {
        if stage == self.stage {
            if let Some(ctx) = self.ctx.lock().unwrap().take() {
                ctx.cancel();
            }
        }
    }
}

fn cancelling_context(stage: PipelineStage) -> JobContext {
    let reporter = Arc::new(CancelOn {
        stage,
        ctx: Mutex::new(None),
    });
    let ctx = JobContext::new(reporter.clone());
    *reporter.ctx.lock().unwrap() = Some(ctx.clone());
    ctx
}

#[test]
fn test_shifted_pair_stacks_back_to_reference() {
    let (a, b) = shifted_pair();
    let job = StackJob::new(vec![a.clone(), b], StackConfig::default())
        .with_reference_stars(manual_stars(&A_STARS));
    let output = run_stack(job, &JobContext::default()).unwrap();

    assert_eq!(output.frames_combined, 2);
    assert_eq!(output.alignments.len(), 1);
    let t = output.alignments[0].result.transform().unwrap();
    assert!((t.tx + 1.0).abs() < 1e-9 && t.ty.abs() < 1e-9, "{t}");
    // Column 3 of the resampled B is uncovered, so only A contributes there.
    assert_frames_close(&output.frame, &a, 1e-6);
}

#[test]
fn test_single_frame_is_insufficient() {
    let err = stack_frames(vec![gradient_frame(4, 4)], StackConfig::default()).unwrap_err();
    assert!(matches!(
        err.error,
        StackError::InsufficientFrames {
            usable: 1,
            required: 2
        }
    ));
    assert!(err.log.iter().any(|line| line.level == LogLevel::Error));
}

#[test]
fn test_failed_frames_are_dropped() {
    let (a, b) = shifted_pair();
    // Two stars cannot be aligned; the job keeps going with the rest.
    let lost = gradient_frame(4, 4).with_stars(manual_stars(&B_STARS[..2]));
    let job = StackJob::new(vec![a, b, lost], StackConfig::default())
        .with_reference_stars(manual_stars(&A_STARS));
    let output = run_stack(job, &JobContext::default()).unwrap();

    assert_eq!(output.frames_combined, 2);
    assert_eq!(output.alignments.len(), 2);
    assert!(output.alignments[0].result.is_aligned());
    assert!(output.alignments[1].result.transform().is_none());
    assert!(output
        .log
        .iter()
        .any(|line| line.level == LogLevel::Warn && line.frame == Some(2)));
}

#[test]
fn test_all_frames_failing_is_fatal() {
    let a = gradient_frame(4, 4);
    let lost = gradient_frame(4, 4).with_stars(manual_stars(&B_STARS[..2]));
    let job = StackJob::new(vec![a, lost], StackConfig::default())
        .with_reference_stars(manual_stars(&A_STARS));
    let err = run_stack(job, &JobContext::default()).unwrap_err();
    assert!(matches!(
        err.error,
        StackError::InsufficientFrames { usable: 1, .. }
    ));
}

#[test]
fn test_alignment_records_failure_reason() {
    let a = gradient_frame(4, 4);
    let (_, b) = shifted_pair();
    let lost = gradient_frame(4, 4).with_stars(manual_stars(&B_STARS[..2]));
    let job = StackJob::new(vec![a, b, lost], StackConfig::default())
        .with_reference_stars(manual_stars(&A_STARS));
    let output = run_stack(job, &JobContext::default()).unwrap();
    let failed = &output.alignments[1];
    assert_eq!(failed.frame, 2);
    assert_eq!(failed.stars, 2);
    assert_eq!(
        failed.result,
        AlignmentResult::failed(AlignFailure::TooFewStars {
            found: 2,
            required: 3
        })
    );
}

#[test]
fn test_cancelled_before_start() {
    let (a, b) = shifted_pair();
    let ctx = JobContext::default();
    ctx.cancel();
    let job = StackJob::new(vec![a, b], StackConfig::default())
        .with_reference_stars(manual_stars(&A_STARS));
    let err = run_stack(job, &ctx).unwrap_err();
    assert!(matches!(
        err.error,
        StackError::Cancelled {
            stage: PipelineStage::Detection
        }
    ));
}

#[test]
fn test_cancel_during_alignment() {
    let (a, b) = shifted_pair();
    let ctx = cancelling_context(PipelineStage::Alignment);
    let job = StackJob::new(vec![a, b], StackConfig::default())
        .with_reference_stars(manual_stars(&A_STARS));
    let err = run_stack(job, &ctx).unwrap_err();
    assert!(matches!(
        err.error,
        StackError::Cancelled {
            stage: PipelineStage::Alignment
        }
    ));
}

#[test]
fn test_cancel_after_combine_is_ignored() {
    for stage in [
        PipelineStage::Stacking,
        PipelineStage::StarRemoval,
        PipelineStage::ToneMapping,
    ] {
        let (a, b) = shifted_pair();
        let ctx = cancelling_context(stage);
        let config = StackConfig {
            star_removal: Some(StarRemovalConfig::default()),
            tone: Some(ToneSettings::default()),
            ..Default::default()
        };
        let job = StackJob::new(vec![a, b], config).with_reference_stars(manual_stars(&A_STARS));
        let output = run_stack(job, &ctx).unwrap_or_else(|f| panic!("{stage}: {}", f.error));
        assert!(ctx.is_cancelled(), "{stage}");
        assert_eq!(output.frames_combined, 2);
    }
}

#[test]
fn test_manual_stars_outside_frame_are_rejected() {
    for bad in [(-50.0, 1e6), (f64::NAN, 2.0), (900.0, -3.0), (4.0, 1.0)] {
        let (a, b) = shifted_pair();
        let stars = manual_stars(&[(0.0, 0.0), bad, (0.0, 3.0)]);
        let job = StackJob::new(vec![a, b], StackConfig::default()).with_reference_stars(stars);
        let err = run_stack(job, &JobContext::default()).unwrap_err();
        match &err.error {
            StackError::InvalidFrame(msg) => assert!(msg.contains("manual star #1"), "{msg}"),
            other => panic!("{bad:?}: unexpected {other}"),
        }
        assert!(err.log.iter().all(|line| line.level != LogLevel::Warn));
    }
}

#[test]
fn test_quality_override_reaches_limb_pass() {
    let reference = frame_with_discs(96, 96, 0.02, &[(40.0, 40.0, 20.0, 0.8)]);
    let target = frame_with_discs(96, 96, 0.02, &[(45.0, 37.0, 20.0, 0.8)]);
    let config = StackConfig {
        alignment: AlignmentMethod::Planetary(PlanetaryConfig::default()),
        ..Default::default()
    };
    let confidence = |quality: u8| {
        let job = StackJob::new(vec![reference.clone(), target.clone()], config.clone())
            .with_quality(quality);
        let output = run_stack(job, &JobContext::default()).unwrap();
        output.alignments[0].result.confidence()
    };
    assert!(confidence(100) > confidence(0));
}

#[test]
fn test_progress_is_monotonic_and_complete() {
    let recorder = Arc::new(Recorder::default());
    let ctx = JobContext::new(recorder.clone());
    let frames: Vec<Frame> = (0..6).map(|_| gradient_frame(16, 16)).collect();
    let config = StackConfig {
        alignment: AlignmentMethod::Dumb(DumbConfig::default()),
        star_removal: Some(StarRemovalConfig::default()),
        ..Default::default()
    };
    run_stack(StackJob::new(frames, config), &ctx).unwrap();

    let fractions = recorder.fractions.lock().unwrap();
    assert!(!fractions.is_empty());
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]), "{fractions:?}");
    assert_eq!(*fractions.last().unwrap(), 1.0);

    // Frames align in parallel, yet the item count never steps backwards.
    assert_eq!(*recorder.items.lock().unwrap(), vec![1, 2, 3, 4, 5]);

    let stages = recorder.stages.lock().unwrap();
    assert!(stages.contains(&PipelineStage::Alignment));
    assert!(stages.contains(&PipelineStage::Stacking));
    assert!(stages.contains(&PipelineStage::StarRemoval));
    assert!(!stages.contains(&PipelineStage::Detection));
}

#[test]
fn test_dumb_identical_frames_keep_reference() {
    let frames: Vec<Frame> = (0..3).map(|_| gradient_frame(16, 16)).collect();
    let config = StackConfig {
        alignment: AlignmentMethod::Dumb(DumbConfig::default()),
        ..Default::default()
    };
    let output = stack_frames(frames, config).unwrap();
    assert_eq!(output.frames_combined, 3);
    for record in &output.alignments {
        let t = record.result.transform().unwrap();
        assert!(t.is_identity(1e-6), "{t}");
    }
    assert_frames_close(&output.frame, &gradient_frame(16, 16), 1e-5);
}

#[test]
fn test_frame_indices_follow_job_order() {
    let (a, b) = shifted_pair();
    let job = StackJob::new(vec![a, b.clone(), b], StackConfig::default())
        .with_reference_stars(manual_stars(&A_STARS));
    let output = run_stack(job, &JobContext::default()).unwrap();
    let frames: Vec<usize> = output.alignments.iter().map(|r| r.frame).collect();
    assert_eq!(frames, vec![1, 2]);
    assert_eq!(output.frames_combined, 3);
    assert_eq!(
        output.alignments[0].result.transform(),
        output.alignments[1].result.transform()
    );
}
