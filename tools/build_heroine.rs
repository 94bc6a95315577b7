/// Build Heroine — expands a character sheet into a `<NAME>_FULL.md` prompt.
///
/// Usage: build_heroine [yaml_path] [--config <file.ron>] [--standalone]
///
/// Without a yaml path the newest sheet in the configured input directory
/// is used.

use clap::Parser;
use heroine_builder::config::{BuildConfig, OutputMode};
use heroine_builder::core::pipeline::{HeroinePipeline, RunRequest};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "build_heroine", version, about = "Expand a heroine sheet into a full prompt document")]
struct Cli {
    /// Character sheet to expand (default: newest file in the input directory)
    yaml_path: Option<PathBuf>,

    /// RON config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Directory searched when no yaml path is given
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Base template for template mode
    #[arg(long)]
    template: Option<PathBuf>,

    /// Directory the document is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// RON rule table replacing the built-in one
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Produce a standalone document instead of merging into the template
    #[arg(long)]
    standalone: bool,

    /// Service timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Parse a saved response instead of calling the service
    #[arg(long, value_name = "FILE")]
    response: Option<PathBuf>,

    /// Save the raw response before parsing it
    #[arg(long, value_name = "FILE")]
    dump_response: Option<PathBuf>,

    /// Log extraction details
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli).unwrap_or_else(|e| {
        tracing::error!("config error: {}", e);
        process::exit(1);
    });

    let pipeline = HeroinePipeline::builder()
        .config(config)
        .build()
        .unwrap_or_else(|e| {
            tracing::error!("{}", e);
            process::exit(1);
        });

    let request = RunRequest {
        input: cli.yaml_path,
        replay_response: cli.response,
        dump_response: cli.dump_response,
    };

    match pipeline.run(&request) {
        Ok(report) => report.log_summary(),
        Err(e) => {
            tracing::error!("{}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<BuildConfig, heroine_builder::config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => BuildConfig::load_from_ron(path)?,
        None => BuildConfig::default(),
    };

    if let Some(dir) = &cli.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(path) = &cli.template {
        config.template_path = path.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(path) = &cli.rules {
        config.rules_path = Some(path.clone());
    }
    if cli.standalone {
        config.mode = OutputMode::Standalone;
    }
    if let Some(secs) = cli.timeout {
        config.service.timeout_secs = secs;
    }

    config.validate()?;
    Ok(config)
}
