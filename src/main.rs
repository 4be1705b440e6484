//! Bunch - dependency bundle cache
//!
//! CLI entry point that dispatches to subcommands.

use bunch::cli::{Cli, Commands};
use bunch::config::ConfigManager;
use bunch::error::{BunchError, BunchResult};
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit status for a download that found nothing cached
const EXIT_CACHE_MISS: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            if e.is_cache_miss() {
                ExitCode::from(EXIT_CACHE_MISS)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run() -> BunchResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(bunch::config::expand_path(path)),
        None => ConfigManager::new(),
    };

    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| BunchError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    init_logging(cli.verbose, &config.general.log_format);
    bunch::ui::init_theme();

    if cli.no_local {
        debug!("Local config discovery disabled (--no-local)");
    } else if let Some(ref path) = local_config_path {
        debug!("Using local config: {}", path.display());
    }

    match cli.command {
        Commands::Upload(args) => bunch::cli::commands::upload(args, &config).await,
        Commands::Download(args) => bunch::cli::commands::download(args, &config).await,
        Commands::Key(args) => bunch::cli::commands::key(args, &config).await,
        Commands::Status(args) => bunch::cli::commands::status(args, &config).await,
        Commands::Config(args) => {
            bunch::cli::commands::config(args, &config_manager, &config).await
        }
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug
fn init_logging(verbose: u8, format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("bunch=warn"),
        1 => EnvFilter::new("bunch=info"),
        _ => EnvFilter::new("bunch=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if format == "json" {
        builder.json().init();
    } else {
        builder.with_target(false).without_time().init();
    }
}
