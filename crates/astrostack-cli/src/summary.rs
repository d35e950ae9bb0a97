use std::path::Path;

use astrostack_core::align::AlignmentResult;
use astrostack_core::pipeline::{LogLevel, LogLine, StackConfig, StackOutput};

use console::Style;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    ok: Style,
    warn: Style,
    error: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            error: Style::new().red().bold(),
        }
    }
}

pub fn print_stack_summary(config: &StackConfig, frames: usize, output: &Path) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("AstroStack"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(10)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(frames)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(output.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Alignment"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Method"),
        s.method.apply_to(&config.alignment)
    );
    if config.alignment.uses_stars() {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Threshold"),
            s.value.apply_to(config.detection.threshold)
        );
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Resample"),
        s.value.apply_to(config.interpolation)
    );
    println!();

    println!("  {}", s.header.apply_to("Stacking"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Combine"),
        s.method.apply_to(config.combine)
    );
    println!();

    println!("  {}", s.header.apply_to("Post-processing"));
    match &config.star_removal {
        Some(removal) => println!(
            "    {:<12}{}",
            s.label.apply_to("Stars"),
            s.method.apply_to(format!("remove (strength {})", removal.strength))
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Stars"),
            s.disabled.apply_to("kept")
        ),
    }
    match &config.tone {
        Some(tone) if tone.auto_levels.is_some() => println!(
            "    {:<12}{}",
            s.label.apply_to("Tone"),
            s.method.apply_to("auto levels")
        ),
        Some(tone) => println!(
            "    {:<12}{}",
            s.label.apply_to("Tone"),
            s.value.apply_to(format!(
                "levels {}-{} gamma {}, exposure {:+}",
                tone.levels.black_point,
                tone.levels.white_point,
                tone.levels.midtones,
                tone.basic.exposure
            ))
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Tone"),
            s.disabled.apply_to("disabled")
        ),
    }
    println!();
}

/// Per-frame alignment table and totals of a finished stack.
pub fn print_stack_report(output: &StackOutput) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Frames"));
    for record in &output.alignments {
        let name = record.label.as_deref().unwrap_or("-");
        match &record.result {
            AlignmentResult::Aligned {
                transform,
                confidence,
            } => println!(
                "    #{:<4}{:<28}{}  {}",
                record.frame,
                name,
                s.ok.apply_to(transform),
                s.label.apply_to(format!("confidence {confidence:.1}"))
            ),
            AlignmentResult::Failed { reason } => println!(
                "    #{:<4}{:<28}{}",
                record.frame,
                name,
                s.warn.apply_to(format!("dropped: {reason}"))
            ),
        }
    }
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Combined"),
        s.value.apply_to(format!(
            "{} of {} frames",
            output.frames_combined,
            output.alignments.len() + 1
        ))
    );
    if let Some(report) = &output.removal {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Stars removed"),
            s.value.apply_to(format!(
                "{} ({} px filled, {} unfilled)",
                report.stars, report.filled, report.unfilled
            ))
        );
    }
}

pub fn print_job_log(lines: &[LogLine]) {
    let s = Styles::new();
    println!();
    for line in lines {
        let style = match line.level {
            LogLevel::Debug => &s.label,
            LogLevel::Info => &s.value,
            LogLevel::Warn => &s.warn,
            LogLevel::Error => &s.error,
        };
        println!("  {}", style.apply_to(line));
    }
}
