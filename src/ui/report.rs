//! Human-readable reports for bakes, lookups and cache maintenance
//!
//! Every printer takes the domain value it describes. Nothing here is
//! printed when the context is not human-facing.

use super::context::UiContext;
use crate::bake::{BakeOutcome, BakeRequest};
use crate::cache::{BakedArtifact, SweepReport};
use crate::overlay::ArtifactRef;
use chrono::{DateTime, Utc};
use console::style;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Info,
    Done,
    Warn,
    Aside,
}

impl Tone {
    fn tag(self) -> console::StyledObject<&'static str> {
        match self {
            Tone::Info => style("[INFO]").cyan(),
            Tone::Done => style("[OK]").green(),
            Tone::Warn => style("[WARN]").yellow(),
            Tone::Aside => style("  ").dim(),
        }
    }
}

fn line(ctx: &UiContext, tone: Tone, text: &str) {
    if !ctx.is_human() {
        return;
    }
    if ctx.use_fancy_output() {
        let shown = match tone {
            Tone::Info => cliclack::log::info(text),
            Tone::Done => cliclack::log::success(text),
            Tone::Warn => cliclack::log::warning(text),
            Tone::Aside => cliclack::log::remark(text),
        };
        shown.ok();
    } else if tone == Tone::Aside {
        println!("  {}", style(text).dim());
    } else {
        println!("  {} {}", tone.tag(), text);
    }
}

fn heading(ctx: &UiContext, title: &str) {
    if !ctx.is_human() {
        return;
    }
    if ctx.use_fancy_output() {
        cliclack::intro(style(title).cyan().bold()).ok();
    } else {
        println!("{}\n", style(title).cyan().bold());
    }
}

fn field(ctx: &UiContext, label: &str, value: &dyn std::fmt::Display) {
    if !ctx.is_human() {
        return;
    }
    let label = if ctx.use_fancy_output() {
        style(label).dim().to_string()
    } else {
        label.to_string()
    };
    println!("  {}: {}", label, value);
}

/// Banner naming the base, engine and overlay count of a bake
pub fn bake_header(ctx: &UiContext, request: &BakeRequest) {
    let overlays = match request.overlays.len() {
        0 => "no overlays".to_string(),
        1 => "1 overlay".to_string(),
        n => format!("{n} overlays"),
    };
    heading(
        ctx,
        &format!(
            "Baking {} for engine {} ({})",
            request.base.base_type, request.base.engine_version, overlays
        ),
    );
}

/// Where the baked game lives and whether it was reused
pub fn bake_outcome(ctx: &UiContext, outcome: &BakeOutcome) {
    if outcome.was_cached {
        line(ctx, Tone::Info, "Already baked, reusing cached game");
    }
    field(ctx, "Name", &outcome.name);
    field(ctx, "Path", &outcome.archive_path.display());
    field(ctx, "Key", &outcome.hash);

    if !ctx.is_human() {
        return;
    }
    let status = if outcome.was_cached { "cached" } else { "baked" };
    let closing = format!("{} ({})", outcome.name, status);
    if ctx.use_fancy_output() {
        cliclack::outro(style(closing).green().bold()).ok();
    } else {
        println!("\n{} {}", Tone::Done.tag(), closing);
    }
}

/// Heading above the cache listing
pub fn listing_header(ctx: &UiContext) {
    heading(ctx, "Baked games");
}

pub fn listing_empty(ctx: &UiContext) {
    line(ctx, Tone::Info, "No baked games");
}

/// `resolve --all` found nothing under any search root
pub fn no_base_candidates(ctx: &UiContext, base: &ArtifactRef) {
    line(
        ctx,
        Tone::Warn,
        &format!(
            "No candidates for '{}' (engine {})",
            base.base_type, base.engine_version
        ),
    );
    line(ctx, Tone::Aside, "Run with -vv to see the directories searched");
}

pub fn sweep_disabled(ctx: &UiContext) {
    line(ctx, Tone::Info, "Cache sweep is disabled (max_age_days = 0)");
}

/// Entries a sweep at `now` selects, with their age in whole days
pub fn sweep_candidates(
    ctx: &UiContext,
    expired: &[BakedArtifact],
    days: u32,
    now: DateTime<Utc>,
) {
    if !ctx.is_human() {
        return;
    }
    if expired.is_empty() {
        println!("No baked games older than {} days.", days);
        return;
    }
    println!(
        "Found {} baked game(s) older than {} days:",
        expired.len(),
        days
    );
    for artifact in expired {
        println!(
            "  {} {} ({} days old)",
            style("•").red(),
            artifact.name,
            (now - artifact.modified).num_days()
        );
    }
    println!();
}

/// One-line summary of what a sweep removed
pub fn sweep_summary(report: &SweepReport) -> String {
    let mut summary = format!(
        "removed {} baked game(s), {} abandoned build(s)",
        report.removed.len(),
        report.stale_staging
    );
    if report.failed > 0 {
        summary.push_str(&format!(" ({} could not be removed)", report.failed));
    }
    summary
}

/// Follow-up note when some entries survived a sweep
pub fn sweep_failures(ctx: &UiContext, report: &SweepReport) {
    if report.failed > 0 {
        line(ctx, Tone::Aside, "Run with -v to see which entries failed");
    }
}

pub fn config_exists(ctx: &UiContext, path: &Path) {
    line(
        ctx,
        Tone::Warn,
        &format!("Config already exists at {}", path.display()),
    );
    line(ctx, Tone::Aside, "Use --force to overwrite");
}

pub fn config_written(ctx: &UiContext, path: &Path) {
    line(
        ctx,
        Tone::Done,
        &format!("Configuration initialized ({})", path.display()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::fingerprint;
    use std::path::PathBuf;

    fn outcome(was_cached: bool) -> BakeOutcome {
        let hash = fingerprint(&ArtifactRef::new("demo", "ev1"), &[]);
        BakeOutcome {
            name: hash.artifact_name(),
            archive_path: PathBuf::from("/data/baked-games").join(hash.artifact_name()),
            hash,
            was_cached,
        }
    }

    #[test]
    fn sweep_summary_mentions_failures_only_when_present() {
        let mut report = SweepReport {
            removed: vec!["baked-0123456789abcdef".to_string()],
            stale_staging: 2,
            failed: 0,
        };
        assert_eq!(
            sweep_summary(&report),
            "removed 1 baked game(s), 2 abandoned build(s)"
        );

        report.failed = 3;
        assert!(sweep_summary(&report).ends_with("(3 could not be removed)"));
    }

    #[test]
    fn printers_run_without_a_terminal() {
        let ctx = UiContext::non_interactive();
        let request = BakeRequest::new("demo", "ev1", vec![]);
        bake_header(&ctx, &request);
        bake_outcome(&ctx, &outcome(false));
        bake_outcome(&ctx, &outcome(true));
        no_base_candidates(&ctx, &request.base);
        sweep_candidates(&ctx, &[], 7, Utc::now());
        config_written(&ctx, Path::new("/tmp/config.toml"));
    }
}
