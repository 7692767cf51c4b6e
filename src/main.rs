//! modbake CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use modbake::cli::{commands, Cli, Commands};
use modbake::config::{Config, ConfigManager};
use modbake::error::BakeResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> BakeResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());

    if let Some(root) = cli.data_root {
        config.paths.data_root = Some(root);
    }

    match cli.command {
        Commands::Bake(args) => commands::bake(args, &config).await,
        Commands::Resolve(args) => commands::resolve(args, &config).await,
        Commands::Fingerprint(args) => commands::fingerprint(args, &config).await,
        Commands::List(args) => commands::list(args, &config).await,
        Commands::Sweep(args) => commands::sweep(args, &config).await,
        Commands::Config(args) => commands::config(args, &config_manager, &config).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug. Logs go to stderr so stdout stays parseable.
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("modbake=warn"),
        1 => EnvFilter::new("modbake=info"),
        _ => EnvFilter::new("modbake=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.json_logs() {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
