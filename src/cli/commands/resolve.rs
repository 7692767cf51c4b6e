//! Resolve command - show which base game a bake would start from

use crate::cli::args::ResolveArgs;
use crate::cli::commands::resolver_from_config;
use crate::config::Config;
use crate::error::BakeResult;
use crate::overlay::ArtifactRef;
use crate::ui::{report, UiContext};

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, config: &Config) -> BakeResult<()> {
    let resolver = resolver_from_config(config);
    let base = ArtifactRef::new(args.base, args.engine);

    if !args.all {
        let path = resolver.resolve_base(&base).await?;
        println!("{}", path.display());
        return Ok(());
    }

    let candidates = resolver.candidates(&base).await?;
    if candidates.is_empty() {
        report::no_base_candidates(&UiContext::detect(), &base);
        return Ok(());
    }

    for (i, path) in candidates.iter().enumerate() {
        let marker = if i == 0 { "*" } else { " " };
        println!("{} {}", marker, path.display());
    }
    Ok(())
}
