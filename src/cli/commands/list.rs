//! List command - show baked games in the cache

use crate::cache::BakedArtifact;
use crate::cli::args::{ListArgs, OutputFormat};
use crate::cli::commands::store_from_config;
use crate::config::Config;
use crate::error::BakeResult;
use crate::overlay::manifest::read_string_field;
use crate::overlay::{ArtifactForm, MANIFEST_FILE};
use crate::ui::{report, UiContext};
use console::style;
use serde::Serialize;

/// One row of output: the cache entry plus the name from its manifest
#[derive(Debug, Serialize)]
struct ListedArtifact {
    #[serde(flatten)]
    artifact: BakedArtifact,

    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

/// Execute the list command
pub async fn execute(args: ListArgs, config: &Config) -> BakeResult<()> {
    let store = store_from_config(config).await?;
    let mut listed = Vec::new();
    for artifact in store.entries().await? {
        let title = manifest_title(&artifact).await;
        listed.push(ListedArtifact { artifact, title });
    }

    let ctx = UiContext::for_format(args.format);
    if listed.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => report::listing_empty(&ctx),
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&ctx, &listed),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listed)?),
        OutputFormat::Plain => print_plain(&listed),
    }

    Ok(())
}

async fn manifest_title(artifact: &BakedArtifact) -> Option<String> {
    if artifact.form != ArtifactForm::Expanded {
        return None;
    }
    let content = tokio::fs::read_to_string(artifact.path.join(MANIFEST_FILE))
        .await
        .ok()?;
    read_string_field(&content, "name")
}

fn print_table(ctx: &UiContext, listed: &[ListedArtifact]) {
    report::listing_header(ctx);

    println!(
        "{:<24} {:<10} {:<18} {:<40}",
        style("NAME").bold(),
        style("FORM").bold(),
        style("MODIFIED").bold(),
        style("CONTENTS").bold()
    );
    println!("{}", "-".repeat(92));

    for entry in listed {
        let modified = entry.artifact.modified.format("%Y-%m-%d %H:%M").to_string();
        let title = entry.title.as_deref().unwrap_or("-");
        println!(
            "{:<24} {:<10} {:<18} {:<40}",
            entry.artifact.name, entry.artifact.form, modified, title
        );
    }

    println!();
    println!("{} baked game(s)", listed.len());
}

fn print_plain(listed: &[ListedArtifact]) {
    for entry in listed {
        println!("{}", entry.artifact.name);
    }
}
