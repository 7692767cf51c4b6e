//! CLI argument definitions using clap derive

use crate::overlay::OverlayRef;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// modbake - bake game overlays into cached composite games
///
/// Copies a base game, layers overlays on top in order, and caches the
/// result under a key derived from the exact combination.
#[derive(Parser, Debug)]
#[command(name = "modbake")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "MODBAKE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Writable data root (overrides paths.data_root)
    #[arg(long, global = true, env = "MODBAKE_DATA_ROOT")]
    pub data_root: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bake a base game with overlays (or reuse the cached result)
    Bake(BakeArgs),

    /// Show which base game directory would be used
    Resolve(ResolveArgs),

    /// Print the combination key without baking
    Fingerprint(FingerprintArgs),

    /// List baked games in the cache
    List(ListArgs),

    /// Remove baked games older than the retention period
    Sweep(SweepArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the bake command
#[derive(Parser, Debug)]
pub struct BakeArgs {
    /// Base game type (e.g. byar)
    pub base: String,

    /// Engine version the base targets
    #[arg(short, long)]
    pub engine: String,

    /// Overlay as NAME:VERSION:PATH, applied in the order given
    #[arg(short, long = "overlay", value_parser = parse_overlay)]
    pub overlays: Vec<OverlayRef>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Base game type
    pub base: String,

    /// Engine version
    #[arg(short, long)]
    pub engine: String,

    /// List every valid candidate in search order
    #[arg(short, long)]
    pub all: bool,
}

/// Arguments for the fingerprint command
#[derive(Parser, Debug)]
pub struct FingerprintArgs {
    /// Base game type
    pub base: String,

    /// Engine version
    #[arg(short, long)]
    pub engine: String,

    /// Overlay as NAME:VERSION (a trailing :PATH is accepted and ignored)
    #[arg(short, long = "overlay", value_parser = parse_overlay_identity)]
    pub overlays: Vec<OverlayRef>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the sweep command
#[derive(Parser, Debug)]
pub struct SweepArgs {
    /// Remove baked games older than N days (default: from config)
    #[arg(long)]
    pub days: Option<u32>,

    /// Dry run - show what would be removed
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for bake and list
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Parse an overlay in NAME:VERSION:PATH format
fn parse_overlay(s: &str) -> Result<OverlayRef, String> {
    let mut parts = s.splitn(3, ':');
    let (name, version, path) = (parts.next(), parts.next(), parts.next());
    match (name, version, path) {
        (Some(name), Some(version), Some(path))
            if !name.is_empty() && !version.is_empty() && !path.is_empty() =>
        {
            Ok(OverlayRef::new(name, version, path))
        }
        _ => Err(format!(
            "invalid overlay '{s}': expected NAME:VERSION:PATH"
        )),
    }
}

/// Parse an overlay identity in NAME:VERSION[:PATH] format
fn parse_overlay_identity(s: &str) -> Result<OverlayRef, String> {
    let mut parts = s.splitn(3, ':');
    match (parts.next(), parts.next()) {
        (Some(name), Some(version)) if !name.is_empty() && !version.is_empty() => {
            Ok(OverlayRef::new(name, version, parts.next().unwrap_or_default()))
        }
        _ => Err(format!("invalid overlay '{s}': expected NAME:VERSION")),
    }
}
