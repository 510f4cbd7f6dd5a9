//! Quill CLI - static-site markup pipeline.
//!
//! Provides commands for:
//! - `build`: Render markdown sources through the hook pipeline into HTML
//! - `check`: Validate front matter tags without rendering

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, CheckArgs};
use output::Output;

/// Quill - static-site markup pipeline.
#[derive(Parser)]
#[command(name = "quill", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the site.
    Build(BuildArgs),
    /// Validate front matter tags.
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Build(args) if args.verbose);

    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Check(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&err);
        std::process::exit(1);
    }
}

/// Log filter for the run.
///
/// `--verbose` enables INFO level, otherwise use `RUST_LOG` or default to WARN.
/// An empty or unparsable `RUST_LOG` also falls back to WARN.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("info");
    }
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::try_parse_from([
            "quill",
            "build",
            "--config",
            "site/quill.toml",
            "--base-url",
            "https://cdn.example.com",
            "--verbose",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Build(args) if args.verbose));
    }

    #[test]
    fn test_check_rejects_build_only_flags() {
        assert!(Cli::try_parse_from(["quill", "check", "--base-url", "/cdn"]).is_err());
    }

    #[test]
    fn test_log_filter_defaults_to_warn() {
        assert_eq!(log_filter(false, None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(false, Some("")).max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_log_filter_sources() {
        assert_eq!(
            log_filter(false, Some("quill_site=debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            log_filter(true, Some("trace")).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}
