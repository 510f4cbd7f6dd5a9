//! `quill build` command implementation.

use std::path::PathBuf;

use clap::Args;
use quill_config::{CliSettings, Config};
use quill_site::SiteBuilder;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover quill.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory for rendered HTML (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// CDN base for image paths (overrides config and ASSET_HOST).
    #[arg(long)]
    base_url: Option<String>,

    /// Enable verbose output (hook and archive logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or any document fails to build.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            base_url: self.base_url,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.field("Source", config.build_resolved.source_dir.display());
        output.field("Output", config.build_resolved.output_dir.display());
        if !config.cdn_base().is_empty() {
            output.field("CDN base", config.cdn_base());
        }
        if config.archive.settings().is_active() {
            output.field("Archives", "enabled");
        }

        let summary = SiteBuilder::from_config(&config)?.build()?;

        output.built(&summary);
        Ok(())
    }
}
