use std::path::PathBuf;

use anyhow::{Context, Result};
use astrostack_core::filters::ToneSettings;
use astrostack_core::pipeline::StackConfig;
use astrostack_core::postprocess::StarRemovalConfig;
use clap::Args;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save a full default StackConfig as TOML, with every optional
/// section filled in so it can be edited.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let config = StackConfig {
        star_removal: Some(StarRemovalConfig::default()),
        tone: Some(ToneSettings::default()),
        ..Default::default()
    };
    let toml_str = toml::to_string_pretty(&config)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
