//! Bake command - build or reuse a baked game

use crate::bake::BakeRequest;
use crate::cli::args::{BakeArgs, OutputFormat};
use crate::cli::commands::baker_from_config;
use crate::config::Config;
use crate::error::BakeResult;
use crate::ui::{report, BakeProgress, UiContext};

/// Execute the bake command
pub async fn execute(args: BakeArgs, config: &Config) -> BakeResult<()> {
    let baker = baker_from_config(config).await?;
    let request = BakeRequest::new(args.base, args.engine, args.overlays);

    let ctx = UiContext::for_format(args.format);
    report::bake_header(&ctx, &request);
    let progress = BakeProgress::for_request(&ctx, &request);

    let result = baker
        .bake_with_progress(&request, |step| progress.on_step(&step))
        .await;
    progress.finish();
    let outcome = result?;

    match args.format {
        OutputFormat::Table => report::bake_outcome(&ctx, &outcome),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Plain => println!("{}", outcome.archive_path.display()),
    }

    Ok(())
}
