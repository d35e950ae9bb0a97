use rayon::prelude::*;
use tracing::info;

use crate::align::{AlignmentResult, Aligner};
use crate::consts::{MIN_STACK_FRAMES, PARALLEL_FRAME_THRESHOLD};
use crate::detection::detect_stars;
use crate::error::{AlignFailure, StackError};
use crate::filters::apply_settings;
use crate::frame::{Frame, Star};
use crate::postprocess::remove_stars;
use crate::resample::resample;
use crate::stack::combine;

use super::config::StackConfig;
use super::job::{JobContext, MonotonicProgress, StackJob};
use super::log::JobLog;
use super::types::{FrameAlignment, PipelineStage, StackFailure, StackOutput};

/// What happened to one non-reference frame.
struct FrameOutcome {
    record: FrameAlignment,
    aligned: Option<Frame>,
}

/// Stack frames with the default context: no progress, no cancellation.
pub fn stack_frames(frames: Vec<Frame>, config: StackConfig) -> Result<StackOutput, StackFailure> {
    run_stack(StackJob::new(frames, config), &JobContext::default())
}

/// Run a stacking job: detect, align and resample every frame against frame
/// 0, combine, then optionally remove stars and tone-map.
///
/// Frames that fail to align are logged and dropped; the job only fails when
/// fewer than two frames remain, on a fatal error, or when cancelled before
/// the combine step.
pub fn run_stack(job: StackJob, ctx: &JobContext) -> Result<StackOutput, StackFailure> {
    let log = JobLog::new();
    match execute(job, ctx, &log) {
        Ok(mut output) => {
            output.log = log.into_lines();
            Ok(output)
        }
        Err(error) => {
            log.error(None, error.to_string());
            Err(StackFailure {
                error,
                log: log.into_lines(),
            })
        }
    }
}

fn execute(job: StackJob, ctx: &JobContext, log: &JobLog) -> Result<StackOutput, StackError> {
    let StackJob {
        frames,
        config,
        quality,
        reference_stars,
    } = job;

    if frames.len() < MIN_STACK_FRAMES {
        return Err(StackError::InsufficientFrames {
            usable: frames.len(),
            required: MIN_STACK_FRAMES,
        });
    }

    let method = config.alignment.clone().with_quality(quality);
    let mut frames: Vec<Frame> = frames
        .into_iter()
        .enumerate()
        .map(|(i, mut frame)| {
            frame.metadata.frame_index = i;
            frame
        })
        .collect();
    let targets = frames.split_off(1);
    let mut reference = frames.remove(0);
    let (width, height) = reference.dimensions();

    log.info(
        PipelineStage::Detection,
        format!(
            "Stacking {} frames ({}x{}) with {} alignment, {} combine",
            targets.len() + 1,
            width,
            height,
            method,
            config.combine
        ),
    );

    // Units: one per target frame, one for the combine, one per post step.
    let post_steps =
        usize::from(config.star_removal.is_some()) + usize::from(config.tone.is_some());
    let progress = MonotonicProgress::new(ctx.reporter.clone(), targets.len() + 1 + post_steps);

    // Reference stars first; every target is matched against them.
    if let Some(stars) = reference_stars {
        check_manual_stars(&stars, width, height)?;
        log.info(
            PipelineStage::Detection,
            format!("Using {} manual reference stars", stars.len()),
        );
        reference.stars = stars;
    } else if method.uses_stars() && reference.stars.is_empty() {
        ctx.reporter.begin_stage(PipelineStage::Detection, Some(1));
        reference.stars = detect_stars(&reference, &config.detection);
        ctx.reporter.finish_stage();
        log.info(
            PipelineStage::Detection,
            format!("Detected {} stars in the reference frame", reference.stars.len()),
        );
    }
    check_cancelled(ctx, PipelineStage::Detection)?;

    ctx.reporter
        .begin_stage(PipelineStage::Alignment, Some(targets.len()));
    let aligner = Aligner::new(&reference, &method);
    let process = |frame: Frame| -> Option<FrameOutcome> {
        if ctx.is_cancelled() {
            return None;
        }
        let outcome = process_frame(frame, &aligner, &config, ctx, log, width, height)?;
        progress.item_done();
        Some(outcome)
    };

    let outcomes: Vec<Option<FrameOutcome>> = if targets.len() + 1 >= PARALLEL_FRAME_THRESHOLD {
        targets.into_par_iter().map(process).collect()
    } else {
        targets.into_iter().map(process).collect()
    };
    ctx.reporter.finish_stage();
    check_cancelled(ctx, PipelineStage::Alignment)?;

    let mut alignments = Vec::with_capacity(outcomes.len());
    let mut aligned = vec![reference];
    for outcome in outcomes.into_iter().flatten() {
        alignments.push(outcome.record);
        if let Some(frame) = outcome.aligned {
            aligned.push(frame);
        }
    }

    let usable = aligned.len();
    if usable < MIN_STACK_FRAMES {
        return Err(StackError::InsufficientFrames {
            usable,
            required: MIN_STACK_FRAMES,
        });
    }
    log.info(
        PipelineStage::Alignment,
        format!("{} of {} frames aligned", usable - 1, alignments.len()),
    );

    // Last chance to cancel: the combine is a barrier and is never abandoned.
    check_cancelled(ctx, PipelineStage::Stacking)?;
    ctx.reporter.begin_stage(PipelineStage::Stacking, Some(usable));
    let mut result = combine(&aligned, &config.combine)?;
    ctx.reporter.finish_stage();
    progress.step();
    log.info(
        PipelineStage::Stacking,
        format!("Combined {} frames ({})", usable, config.combine),
    );
    drop(aligned);

    let mut removal = None;
    if let Some(removal_config) = &config.star_removal {
        ctx.reporter.begin_stage(PipelineStage::StarRemoval, None);
        let (cleaned, report) = remove_stars(&result, removal_config);
        ctx.reporter.finish_stage();
        progress.step();
        log.info(
            PipelineStage::StarRemoval,
            format!(
                "Removed {} stars: {} px masked, {} filled, {} unfilled",
                report.stars, report.masked, report.filled, report.unfilled
            ),
        );
        result = cleaned;
        removal = Some(report);
    }

    if let Some(tone) = &config.tone {
        ctx.reporter.begin_stage(PipelineStage::ToneMapping, None);
        result = apply_settings(&result, tone);
        ctx.reporter.finish_stage();
        progress.step();
        log.info(PipelineStage::ToneMapping, "Applied levels and adjustments");
    }

    progress.finish();
    info!(frames = usable, "Stack complete");

    Ok(StackOutput {
        frame: result,
        alignments,
        frames_combined: usable,
        removal,
        log: Vec::new(),
    })
}

/// Detect, align and resample one target frame.
///
/// Returns `None` if the job was cancelled part-way.
fn process_frame(
    mut frame: Frame,
    aligner: &Aligner<'_>,
    config: &StackConfig,
    ctx: &JobContext,
    log: &JobLog,
    width: usize,
    height: usize,
) -> Option<FrameOutcome> {
    let index = frame.metadata.frame_index;
    if aligner.method().uses_stars() && frame.stars.is_empty() {
        frame.stars = detect_stars(&frame, &config.detection);
        log.debug_frame(
            PipelineStage::Detection,
            index,
            format!("{} stars detected", frame.stars.len()),
        );
    }
    if ctx.is_cancelled() {
        return None;
    }

    let alignment = aligner.align(&frame);
    if ctx.is_cancelled() {
        return None;
    }

    let (result, aligned) = match alignment {
        AlignmentResult::Aligned {
            transform,
            confidence,
        } => match resample(&frame, &transform, width, height, config.interpolation) {
            Ok(resampled) => {
                log.debug_frame(
                    PipelineStage::Alignment,
                    index,
                    format!("aligned: {transform} (confidence {confidence:.1})"),
                );
                (alignment, Some(resampled))
            }
            Err(e) => {
                let reason = AlignFailure::ResampleFailed(e.to_string());
                log.warn_frame(PipelineStage::Alignment, index, format!("dropped: {reason}"));
                (AlignmentResult::failed(reason), None)
            }
        },
        AlignmentResult::Failed { ref reason } => {
            log.warn_frame(PipelineStage::Alignment, index, format!("dropped: {reason}"));
            (alignment, None)
        }
    };

    Some(FrameOutcome {
        record: FrameAlignment {
            frame: index,
            label: frame.metadata.label.clone(),
            stars: frame.stars.len(),
            result,
        },
        aligned,
    })
}

/// Manual stars must be finite and inside the reference frame.
fn check_manual_stars(stars: &[Star], width: usize, height: usize) -> Result<(), StackError> {
    let outside = |v: f64, limit: usize| !v.is_finite() || v < 0.0 || v >= limit as f64;
    match stars
        .iter()
        .position(|s| outside(s.x, width) || outside(s.y, height))
    {
        Some(i) => Err(StackError::InvalidFrame(format!(
            "manual star #{i} at ({}, {}) lies outside the {width}x{height} reference frame",
            stars[i].x, stars[i].y
        ))),
        None => Ok(()),
    }
}

fn check_cancelled(ctx: &JobContext, stage: PipelineStage) -> Result<(), StackError> {
    if ctx.is_cancelled() {
        Err(StackError::Cancelled { stage })
    } else {
        Ok(())
    }
}
