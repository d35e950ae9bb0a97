use std::path::PathBuf;

use anyhow::{Context, Result};
use astrostack_core::consts::ALPHA;
use astrostack_core::detection::{detect_stars, StarDetectionConfig};
use astrostack_core::io::load_frame;
use clap::Args;

#[derive(Args)]
pub struct InfoArgs {
    /// Input image
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let frame = load_frame(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    let alpha = frame.channel(ALPHA);
    let opaque = alpha.iter().filter(|&&a| a >= 1.0).count();
    let transparent = alpha.iter().filter(|&&a| a <= 0.0).count();
    let pixels = frame.width() * frame.height();

    println!("File:        {}", args.file.display());
    println!("Dimensions:  {}x{}", frame.width(), frame.height());
    println!("Bit depth:   {}", frame.original_bit_depth);
    println!("Pixels:      {pixels}");
    if transparent > 0 || opaque < pixels {
        println!(
            "Coverage:    {opaque} opaque, {transparent} transparent, {} partial",
            pixels - opaque - transparent
        );
    } else {
        println!("Coverage:    fully opaque");
    }

    for (name, ch) in [("Red", 0), ("Green", 1), ("Blue", 2)] {
        let values = frame.channel(ch);
        let (min, max) = values
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / pixels.max(1) as f64;
        println!("{name:<7}      min {min:.4}  mean {mean:.4}  max {max:.4}");
    }

    let stars = detect_stars(&frame, &StarDetectionConfig::default());
    println!("Stars:       {}", stars.len());

    let total_mb = (pixels * 4 * std::mem::size_of::<f32>()) as f64 / (1024.0 * 1024.0);
    println!("In memory:   {total_mb:.1} MB");

    Ok(())
}
