use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use astrostack_core::align::{
    AlignmentMethod, ConsensusConfig, DumbConfig, PlanetaryConfig, StandardConfig,
};
use astrostack_core::frame::{Frame, Star};
use astrostack_core::io::{load_frame, save_frame};
use astrostack_core::pipeline::{run_stack, JobContext, StackConfig, StackJob};
use astrostack_core::postprocess::StarRemovalConfig;
use astrostack_core::resample::Interpolation;
use astrostack_core::stack::{CombineMode, SigmaClipParams};
use clap::{Args, ValueEnum};
use console::Style;

use crate::progress::BarReporter;
use crate::summary::{print_job_log, print_stack_report, print_stack_summary};

#[derive(Clone, ValueEnum)]
pub enum AlignArg {
    Standard,
    Consensus,
    Planetary,
    Dumb,
}

#[derive(Clone, ValueEnum)]
pub enum CombineArg {
    Average,
    Median,
    Lighten,
    Darken,
    SigmaClip,
}

#[derive(Clone, ValueEnum)]
pub enum InterpolationArg {
    Bilinear,
    Nearest,
}

#[derive(Args)]
pub struct StackArgs {
    /// Input frames; the first one is the reference
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Load settings from a TOML config; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Alignment strategy
    #[arg(long, value_enum)]
    pub align: Option<AlignArg>,

    /// Combine mode
    #[arg(long, value_enum)]
    pub combine: Option<CombineArg>,

    /// Sigma threshold for sigma-clip combining
    #[arg(long)]
    pub sigma: Option<f32>,

    /// Resampling kernel
    #[arg(long, value_enum)]
    pub interpolation: Option<InterpolationArg>,

    /// Planetary limb quality (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub quality: Option<u8>,

    /// Star detection threshold (0-1)
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Manual reference star as X,Y; repeat for more
    #[arg(long = "star", value_parser = parse_point)]
    pub stars: Vec<(f64, f64)>,

    /// Remove stars brighter than STRENGTH (0-1) from the stacked result
    #[arg(long, value_name = "STRENGTH")]
    pub remove_stars: Option<f32>,

    /// Levels black point (0-255)
    #[arg(long)]
    pub black: Option<u8>,

    /// Levels white point (0-255)
    #[arg(long)]
    pub white: Option<u8>,

    /// Levels midtone gamma
    #[arg(long)]
    pub midtones: Option<f32>,

    /// Exposure, 100 per stop (0 = unchanged)
    #[arg(long, allow_hyphen_values = true)]
    pub exposure: Option<f32>,

    /// Brightness in percent (100 = unchanged)
    #[arg(long)]
    pub brightness: Option<f32>,

    /// Saturation in percent (100 = unchanged)
    #[arg(long)]
    pub saturation: Option<f32>,

    /// Derive levels from the 0.1% / 99.9% luma percentiles
    #[arg(long)]
    pub auto_levels: bool,

    /// Print the full job log
    #[arg(long)]
    pub log: bool,

    /// Output file path (.tiff, .png or any format the image crate writes)
    #[arg(short, long, default_value = "stacked.tiff")]
    pub output: PathBuf,
}

fn parse_point(s: &str) -> std::result::Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{s}'"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad X in '{s}': {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad Y in '{s}': {e}"))?;
    if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
        return Err(format!("star position must be finite and non-negative, got '{s}'"));
    }
    Ok((x, y))
}

pub fn run(args: &StackArgs) -> Result<()> {
    let config = build_config(args)?;
    let frames = load_frames(&args.files)?;

    print_stack_summary(&config, frames.len(), &args.output);

    let mut job = StackJob::new(frames, config);
    if let Some(q) = args.quality {
        job = job.with_quality(q);
    }
    if !args.stars.is_empty() {
        job = job.with_reference_stars(
            args.stars.iter().map(|&(x, y)| Star::manual(x, y)).collect(),
        );
    }

    let reporter = Arc::new(BarReporter::new()?);
    let ctx = JobContext::new(reporter.clone());

    let output = match run_stack(job, &ctx) {
        Ok(output) => {
            reporter.finish("Done");
            output
        }
        Err(failure) => {
            reporter.abandon();
            print_job_log(&failure.log);
            return Err(failure.into());
        }
    };

    print_stack_report(&output);
    if args.log {
        print_job_log(&output.log);
    }

    save_frame(&output.frame, &args.output)
        .with_context(|| format!("Failed to save {}", args.output.display()))?;
    println!("\nOutput saved to {}", args.output.display());
    Ok(())
}

fn build_config(args: &StackArgs) -> Result<StackConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => StackConfig::default(),
    };

    if let Some(align) = &args.align {
        config.alignment = match align {
            AlignArg::Standard => AlignmentMethod::Standard(StandardConfig::default()),
            AlignArg::Consensus => AlignmentMethod::Consensus(ConsensusConfig::default()),
            AlignArg::Planetary => AlignmentMethod::Planetary(PlanetaryConfig::default()),
            AlignArg::Dumb => AlignmentMethod::Dumb(DumbConfig::default()),
        };
    }

    if let Some(combine) = &args.combine {
        config.combine = match combine {
            CombineArg::Average => CombineMode::Average,
            CombineArg::Median => CombineMode::Median,
            CombineArg::Lighten => CombineMode::Lighten,
            CombineArg::Darken => CombineMode::Darken,
            CombineArg::SigmaClip => CombineMode::SigmaClip(SigmaClipParams::default()),
        };
    }
    if let (Some(sigma), CombineMode::SigmaClip(params)) = (args.sigma, &mut config.combine) {
        params.sigma = sigma;
    }

    if let Some(interp) = &args.interpolation {
        config.interpolation = match interp {
            InterpolationArg::Bilinear => Interpolation::Bilinear,
            InterpolationArg::Nearest => Interpolation::Nearest,
        };
    }

    if let Some(threshold) = args.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            bail!("--threshold must be within 0..1, got {threshold}");
        }
        config.detection.threshold = threshold;
    }

    if let Some(strength) = args.remove_stars {
        if !(0.0..=1.0).contains(&strength) {
            bail!("--remove-stars strength must be within 0..1, got {strength}");
        }
        config
            .star_removal
            .get_or_insert_with(StarRemovalConfig::default)
            .strength = strength;
    }

    let tone_flags = args.black.is_some()
        || args.white.is_some()
        || args.midtones.is_some()
        || args.exposure.is_some()
        || args.brightness.is_some()
        || args.saturation.is_some()
        || args.auto_levels;
    if tone_flags {
        let tone = config.tone.get_or_insert_with(Default::default);
        if let Some(v) = args.black {
            tone.levels.black_point = v;
        }
        if let Some(v) = args.white {
            tone.levels.white_point = v;
        }
        if let Some(v) = args.midtones {
            tone.levels.midtones = v;
        }
        if let Some(v) = args.exposure {
            tone.basic.exposure = v;
        }
        if let Some(v) = args.brightness {
            tone.basic.brightness = v;
        }
        if let Some(v) = args.saturation {
            tone.basic.saturation = v;
        }
        if args.auto_levels {
            tone.auto_levels = Some((0.001, 0.999));
        }
        if tone.levels.white_point <= tone.levels.black_point {
            bail!(
                "white point ({}) must be above black point ({})",
                tone.levels.white_point,
                tone.levels.black_point
            );
        }
    }

    Ok(config)
}

fn load_config(path: &Path) -> Result<StackConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

/// Decode every input, skipping the ones that fail. The reference must load.
fn load_frames(paths: &[PathBuf]) -> Result<Vec<Frame>> {
    let warn = Style::new().yellow();
    let mut frames = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        match load_frame(path) {
            Ok(frame) => frames.push(frame),
            Err(e) if i == 0 => {
                return Err(e).with_context(|| {
                    format!("Failed to load reference frame {}", path.display())
                });
            }
            Err(e) => {
                eprintln!(
                    "{}",
                    warn.apply_to(format!("Skipping {}: {e}", path.display()))
                );
            }
        }
    }
    Ok(frames)
}
