use std::path::PathBuf;

use anyhow::{Context, Result};
use astrostack_core::detection::{detect_stars, StarDetectionConfig};
use astrostack_core::io::load_frame;
use clap::Args;

#[derive(Args)]
pub struct DetectArgs {
    /// Input image
    pub file: PathBuf,

    /// Brightness threshold (0-1)
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Only print the N brightest stars
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn run(args: &DetectArgs) -> Result<()> {
    let frame = load_frame(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    let mut config = StarDetectionConfig::default();
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    config.max_stars = args.limit;

    let stars = detect_stars(&frame, &config);
    println!(
        "{} stars in {} ({}x{})",
        stars.len(),
        args.file.display(),
        frame.width(),
        frame.height()
    );
    println!("{:>10} {:>10} {:>12} {:>6} {:>7}", "x", "y", "brightness", "px", "fwhm");
    for star in &stars {
        let fwhm = star
            .fwhm
            .map(|f| format!("{f:.2}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:>10.2} {:>10.2} {:>12.3} {:>6} {:>7}",
            star.x, star.y, star.brightness, star.size, fwhm
        );
    }
    Ok(())
}
