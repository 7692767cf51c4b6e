//! Sweep command - evict old baked games

use crate::cli::args::SweepArgs;
use crate::cli::commands::baker_from_config;
use crate::config::schema::days_to_duration;
use crate::config::Config;
use crate::error::BakeResult;
use crate::ui::{report, TaskSpinner, UiContext};
use chrono::Utc;
use std::time::SystemTime;

/// Execute the sweep command
pub async fn execute(args: SweepArgs, config: &Config) -> BakeResult<()> {
    let ctx = UiContext::detect();
    let (days, max_age) = match args.days {
        Some(days) => (days, days_to_duration(days)),
        None => (config.cache.max_age_days, config.cache.max_age()),
    };

    let Some(max_age) = max_age else {
        report::sweep_disabled(&ctx);
        return Ok(());
    };

    let baker = baker_from_config(config).await?;
    let expired = baker.store().expired_at(max_age, SystemTime::now()).await?;

    if args.dry_run || !expired.is_empty() {
        report::sweep_candidates(&ctx, &expired, days, Utc::now());
    }
    if args.dry_run {
        if !expired.is_empty() {
            println!("Dry run - nothing removed.");
        }
        return Ok(());
    }

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start("Sweeping cache...");
    let swept = baker.sweep(max_age).await?;

    let summary = report::sweep_summary(&swept);
    if swept.failed > 0 {
        spinner.stop_error(&summary);
        report::sweep_failures(&ctx, &swept);
    } else {
        spinner.stop(&summary);
    }

    Ok(())
}
